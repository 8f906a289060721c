//! GTK4 front-end.

mod idle;
mod window;

use std::process::ExitCode;

use gtk4::prelude::*;
use gtk4::{Application, glib};
use tracing::{debug, error, info};

use iconsel_core::Config;

/// Raise `existing` when a dialog is already open, otherwise build one.
fn raise_or_build<W>(
    existing: Option<W>,
    raise: impl FnOnce(&W),
    build: impl FnOnce() -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    match existing {
        Some(window) => {
            raise(&window);
            Ok(())
        }
        None => build(),
    }
}

/// Run the dialog as a GTK application until its window closes.
pub fn run(config: Config) -> ExitCode {
    let app = Application::builder()
        .application_id("io.github.iconsel")
        .build();

    // A second launch activates this instance again; keep a single dialog.
    app.connect_activate(move |app| {
        info!("GTK application activated");
        let result = raise_or_build(
            app.active_window(),
            |window| {
                debug!("Icon theme dialog already open, raising it");
                window.present();
            },
            || window::present(app, &config),
        );
        if let Err(e) = result {
            error!("Could not open the icon theme dialog: {:#}", e);
            app.quit();
        }
    });

    // Arguments were already parsed by clap.
    let empty_args: Vec<String> = vec![];
    let status = app.run_with_args(&empty_args);

    if status == glib::ExitCode::SUCCESS {
        ExitCode::SUCCESS
    } else {
        error!("GTK application exited with error");
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_open_dialog_is_raised_not_rebuilt() {
        let raised = Cell::new(0);
        let built = Cell::new(0);

        raise_or_build(
            Some("dialog"),
            |_| raised.set(raised.get() + 1),
            || {
                built.set(built.get() + 1);
                Ok(())
            },
        )
        .unwrap();

        assert_eq!((raised.get(), built.get()), (1, 0));
    }

    #[test]
    fn test_dialog_built_when_none_open() {
        let built = Cell::new(0);

        raise_or_build(
            None::<()>,
            |_| panic!("nothing to raise"),
            || {
                built.set(built.get() + 1);
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(built.get(), 1);
    }

    #[test]
    fn test_build_error_is_returned() {
        let result = raise_or_build(None::<()>, |_| {}, || anyhow::bail!("no display"));
        assert!(result.is_err());
    }
}
