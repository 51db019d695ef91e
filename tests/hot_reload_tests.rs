use gatehouse::config::{ConfigSnapshot, YamlConfigStore};
use gatehouse::controller::Controller;
use gatehouse::dispatcher::Dispatcher;
use gatehouse::hot_reload::watch_config;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::collaborators::{StaticOrigins, StaticSession};
use common::requests;

const CONFIG_V1: &str = "admin_ui:\n  base_path: /ui\n";
const CONFIG_V2: &str = "admin_ui:\n  base_path: /console\n";

fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..50 {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    false
}

#[test]
fn test_watch_config_reload() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, CONFIG_V1).unwrap();

    let store = Arc::new(YamlConfigStore::load(&path).unwrap());
    let dispatcher = Dispatcher::builder(
        Controller::builder("panel")
            .handler("index", |_| Ok(()))
            .build()
            .unwrap(),
    )
    .origin(Arc::new(StaticOrigins::permitting(&[requests::LOCAL])))
    .sessions(Arc::new(StaticSession::invalid()))
    .config(Arc::clone(&store) as Arc<dyn gatehouse::config::ConfigStore>)
    .build();

    let location = |d: &Dispatcher| {
        d.run(&requests::get("/"))
            .get_header("Location")
            .map(str::to_string)
    };
    assert_eq!(location(&dispatcher).as_deref(), Some("/ui/authentication"));

    let _watcher = watch_config(Arc::clone(&store)).expect("watch_config");
    // allow watcher thread to start
    std::thread::sleep(Duration::from_millis(100));

    std::fs::write(&path, CONFIG_V2).unwrap();
    assert!(wait_for(|| location(&dispatcher).as_deref() == Some("/console/authentication")));
}

#[test]
fn test_invalid_yaml_keeps_previous_document() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, CONFIG_V2).unwrap();
    let store = YamlConfigStore::load(&path).unwrap();

    std::fs::write(&path, "admin_ui: [unclosed\n").unwrap();
    assert!(store.reload().is_err());
    assert_eq!(ConfigSnapshot::from_store(&store).base_path, "/console");

    std::fs::write(&path, CONFIG_V1).unwrap();
    store.reload().unwrap();
    assert_eq!(ConfigSnapshot::from_store(&store).base_path, "/ui");
}

#[test]
fn test_truncated_file_keeps_previous_document() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "http:\n  web_server_imitation:\n    enable: true\n    type: iis\nadmin_ui:\n  base_path: /console\n",
    )
    .unwrap();
    let store = YamlConfigStore::load(&path).unwrap();

    std::fs::write(&path, "").unwrap();
    assert!(store.reload().is_err());

    let snapshot = ConfigSnapshot::from_store(&store);
    assert!(snapshot.impersonation_enabled);
    assert_eq!(snapshot.impersonation_type, "iis");
    assert_eq!(snapshot.base_path, "/console");
}
