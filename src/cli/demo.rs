//! Demo admin app driven by the CLI.
//!
//! Two controllers: `authentication` (the login page, reachable without a
//! session) and `panel` (an index page plus a JSON listing of hooks).

use crate::controller::{Controller, ControllerKind};
use crate::dispatcher::Collaborators;
use crate::registry::AdminApp;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct Hook {
    name: &'static str,
    enabled: bool,
}

const HOOKS: &[Hook] = &[
    Hook {
        name: "on_connect",
        enabled: true,
    },
    Hook {
        name: "on_disconnect",
        enabled: false,
    },
];

pub fn authentication_controller() -> anyhow::Result<Controller> {
    let controller = Controller::builder("Authentication")
        .kind(ControllerKind::Authentication)
        .handler("index", |ctx| {
            let form = format!(
                "<form method=\"post\">{}<input type=\"password\" name=\"passwd\" /></form>",
                ctx.nonce_tag()
            );
            ctx.set_body(form);
            Ok(())
        })
        .build()?;
    Ok(controller)
}

pub fn panel_controller() -> anyhow::Result<Controller> {
    let controller = Controller::builder("Panel")
        .handler("index", |ctx| {
            ctx.set_var("hooks", HOOKS)?;
            let stylesheet = ctx.stylesheet_tag("panel.css");
            ctx.set_var("stylesheet", stylesheet)?;
            ctx.set_body("Admin panel");
            Ok(())
        })
        .handler("hooks", |ctx| ctx.set_json(&HOOKS))
        .route("/", "index")
        .route("/hooks.json", "hooks")
        .build()?;
    Ok(controller)
}

/// Both demo controllers mounted over `collaborators`.
pub fn demo_app(collaborators: Collaborators) -> anyhow::Result<AdminApp> {
    let mut app = AdminApp::new(collaborators);
    app.mount(authentication_controller()?);
    app.mount(panel_controller()?);
    Ok(app)
}
