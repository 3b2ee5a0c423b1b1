use super::UiExit;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::pipe::LineReceiver;
use crate::registry::Registry;
use crate::tray::icon::load_icon;
use crate::tray::{TrayBackend, TrayHandle};
use anyhow::{Context, Result};
use gtk::{self, glib};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

pub struct GtkBackend;

impl TrayBackend for GtkBackend {
    type Handle = GtkTray;

    fn create(&mut self, name: &str) -> Result<GtkTray> {
        Ok(GtkTray {
            name: name.to_string(),
            tray: None,
            icon: None,
            tooltip: String::new(),
        })
    }
}

/// tray-icon shows an icon as soon as it is built, so the real icon is only
/// built the first time this handle has to be visible.
pub struct GtkTray {
    name: String,
    tray: Option<TrayIcon>,
    icon: Option<Icon>,
    tooltip: String,
}

impl GtkTray {
    fn build(&self) -> Result<TrayIcon> {
        let mut builder = TrayIconBuilder::new().with_tooltip(&self.tooltip);
        if let Some(icon) = &self.icon {
            builder = builder.with_icon(icon.clone());
        }
        builder
            .build()
            .with_context(|| format!("Failed to create tray icon {}", self.name))
    }
}

impl TrayHandle for GtkTray {
    fn set_image(&mut self, path: Option<&Path>) -> Result<()> {
        let icon = path.map(load_icon).transpose()?;
        if let Some(tray) = &self.tray {
            tray.set_icon(icon.clone())?;
        }
        self.icon = icon;
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<()> {
        if let Some(tray) = &self.tray {
            tray.set_visible(visible)?;
            return Ok(());
        }
        if visible {
            self.tray = Some(self.build()?);
        }
        Ok(())
    }

    fn set_tooltip(&mut self, tooltip: &str) -> Result<()> {
        // No-op on GTK in tray-icon 0.21; the text is still tracked.
        if let Some(tray) = &self.tray {
            tray.set_tooltip(Some(tooltip))?;
        }
        self.tooltip = tooltip.to_string();
        Ok(())
    }
}

pub fn spawn_ui(config: Config, lines: LineReceiver) -> Result<UiExit> {
    let (done_tx, done_rx) = oneshot::channel();

    std::thread::Builder::new()
        .name("multitray-ui".into())
        .spawn(move || {
            let _ = done_tx.send(run_event_loop(config, lines));
        })
        .context("Failed to spawn UI thread")?;

    Ok(done_rx)
}

fn run_event_loop(config: Config, lines: LineReceiver) -> Result<()> {
    gtk::init().context("Failed to initialize GTK")?;

    let registry = Registry::new(GtkBackend, config.blink_interval);
    let dispatcher = Rc::new(RefCell::new(Dispatcher::new(registry, lines)));

    every(config.dispatch_interval, &dispatcher, |dispatcher| {
        dispatcher.tick(Instant::now());
    });
    every(config.blink_resolution, &dispatcher, |dispatcher| {
        dispatcher.advance_blinkers(Instant::now());
    });

    log::info!("Tray event loop running");
    gtk::main();
    anyhow::bail!("GTK main loop returned")
}

fn every<F>(interval: Duration, dispatcher: &Rc<RefCell<Dispatcher<GtkBackend>>>, mut f: F)
where
    F: FnMut(&mut Dispatcher<GtkBackend>) + 'static,
{
    let dispatcher = Rc::clone(dispatcher);
    glib::timeout_add_local(interval, move || {
        f(&mut dispatcher.borrow_mut());
        glib::ControlFlow::Continue
    });
}
