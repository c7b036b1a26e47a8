//! End-to-end behaviour of a link driven through the in-memory host.

use std::io;
use std::sync::{Arc, Mutex};

use mitmlight_adapter_memory::{InMemoryHost, MemoryHostConfig, VirtualLightConfig};
use mitmlight_app::config_flow::FlowResult;
use mitmlight_app::ports::{RestoreStateStore, StateStore};
use mitmlight_app::services::link_manager::LinkManager;
use mitmlight_domain::entity::{Entity, EntityState};
use mitmlight_domain::light::{
    ATTR_COLOR_MODE, ATTR_HS_COLOR, ATTR_RGB_COLOR, ATTR_SUPPORTED_COLOR_MODES, ColorMode,
};
use mitmlight_domain::link::{CONF_SOURCE_ENTITY_ID, ConfigEntry, ConfigMap};
use mitmlight_domain::service::ServiceCall;

const TARGET: &str = "light.desk";
const TOGGLE: &str = "switch.desk_overridden";
const PRIMARY: &str = "light.desk_proxy";
const OVERRIDE: &str = "light.desk_override";

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

fn desk_lamp() -> VirtualLightConfig {
    VirtualLightConfig {
        entity_id: TARGET.to_string(),
        name: "Desk lamp".to_string(),
        supported_color_modes: vec![ColorMode::Hs, ColorMode::Rgb, ColorMode::ColorTemp],
        supported_features: 44,
        min_color_temp_kelvin: Some(2000),
        max_color_temp_kelvin: Some(6500),
        effect_list: Some(vec!["colorloop".to_string()]),
        ..VirtualLightConfig::default()
    }
}

async fn host_with_lamp() -> Arc<InMemoryHost> {
    let config = MemoryHostConfig {
        lights: vec![desk_lamp()],
        ..MemoryHostConfig::default()
    };
    Arc::new(InMemoryHost::from_config(&config).await.unwrap())
}

fn entry() -> ConfigEntry {
    let mut data = ConfigMap::new();
    data.insert(CONF_SOURCE_ENTITY_ID.to_string(), TARGET.into());
    ConfigEntry::new("Desk", data)
}

fn call(service: &str, entity_id: &str, data: serde_json::Value) -> ServiceCall {
    let domain = entity_id.split_once('.').map_or("", |(domain, _)| domain);
    let data = match data {
        serde_json::Value::Object(map) => map,
        _ => ConfigMap::new(),
    };
    ServiceCall::new(domain, service, entity_id, data)
}

/// Calls the integration sent to the target light.
fn forwarded(host: &InMemoryHost) -> Vec<ServiceCall> {
    host.service_calls()
        .into_iter()
        .filter(|call| call.entity_id == TARGET)
        .collect()
}

fn payload(call: &ServiceCall) -> serde_json::Value {
    serde_json::Value::Object(call.data.clone())
}

async fn manager_with_link(host: &Arc<InMemoryHost>) -> LinkManager<InMemoryHost> {
    let mut manager = LinkManager::new(Arc::clone(host));
    manager.add_entry(entry()).await.unwrap();
    manager
}

#[tokio::test]
async fn should_create_entry_from_user_flow_titled_after_target() {
    let host = host_with_lamp().await;
    let mut manager = LinkManager::new(Arc::clone(&host));

    let mut input = ConfigMap::new();
    input.insert(CONF_SOURCE_ENTITY_ID.to_string(), TARGET.into());
    let result = manager.user_flow(Some(&input)).await.unwrap();

    assert!(matches!(result, FlowResult::CreateEntry { ref title, .. } if title == "Desk lamp"));
    assert!(host.state("switch.desk_lamp_overridden").is_some());
    assert!(host.state("light.desk_lamp_proxy").is_some());
    assert!(host.state("light.desk_lamp_override").is_some());
}

#[tokio::test]
async fn should_attach_entities_to_target_device() {
    let host = host_with_lamp().await;
    let _manager = manager_with_link(&host).await;

    let device_id = host.registry_record(TARGET).unwrap().device_id;
    assert!(device_id.is_some());
    for entity_id in [TOGGLE, PRIMARY, OVERRIDE] {
        assert_eq!(host.registry_record(entity_id).unwrap().device_id, device_id);
        assert_eq!(host.state(entity_id).unwrap().device_id, device_id);
    }
}

#[tokio::test]
async fn should_mirror_target_capabilities() {
    let host = host_with_lamp().await;
    let _manager = manager_with_link(&host).await;

    let proxy = host.state(PRIMARY).unwrap();
    let target = host.state(TARGET).unwrap();
    assert_eq!(
        proxy.get_attribute(ATTR_SUPPORTED_COLOR_MODES),
        target.get_attribute(ATTR_SUPPORTED_COLOR_MODES)
    );
}

#[tokio::test]
async fn should_clear_previous_color_when_new_one_is_set() {
    let host = host_with_lamp().await;
    let mut manager = manager_with_link(&host).await;

    manager
        .handle_service_call(&call("turn_on", OVERRIDE, serde_json::json!({ "hs_color": [10.0, 20.0] })))
        .await
        .unwrap();
    manager
        .handle_service_call(&call("turn_on", OVERRIDE, serde_json::json!({ "rgb_color": [255, 0, 0] })))
        .await
        .unwrap();

    let proxy = host.state(OVERRIDE).unwrap();
    assert!(proxy.get_attribute(ATTR_HS_COLOR).is_none());
    assert!(proxy.get_attribute(ATTR_RGB_COLOR).is_some());
    assert_eq!(
        proxy.get_attribute(ATTR_COLOR_MODE).and_then(|v| v.as_str()),
        Some("rgb")
    );
}

#[tokio::test]
async fn should_forward_only_given_attributes_from_active_proxy() {
    let host = host_with_lamp().await;
    let mut manager = manager_with_link(&host).await;

    manager
        .handle_service_call(&call(
            "turn_on",
            PRIMARY,
            serde_json::json!({ "brightness": 90, "color_temp_kelvin": 3000, "effect": "colorloop" }),
        ))
        .await
        .unwrap();
    host.clear_service_calls();

    manager
        .handle_service_call(&call(
            "turn_on",
            PRIMARY,
            serde_json::json!({ "brightness": 30, "transition": 4 }),
        ))
        .await
        .unwrap();

    let calls = forwarded(&host);
    assert_eq!(calls.len(), 1);
    assert_eq!(
        payload(&calls[0]),
        serde_json::json!({ "brightness": 30, "transition": 4.0 })
    );
}

#[tokio::test]
async fn should_swap_in_complete_staged_state_when_toggle_turns_on() {
    let host = host_with_lamp().await;
    let mut manager = manager_with_link(&host).await;

    for data in [
        serde_json::json!({ "brightness": 10 }),
        serde_json::json!({ "hs_color": [200.0, 60.0] }),
        serde_json::json!({ "effect": "colorloop", "transition": 1 }),
    ] {
        manager
            .handle_service_call(&call("turn_on", OVERRIDE, data))
            .await
            .unwrap();
    }
    assert!(forwarded(&host).is_empty());

    manager
        .handle_service_call(&call("turn_on", TOGGLE, serde_json::json!({})))
        .await
        .unwrap();

    let calls = forwarded(&host);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service, "turn_on");
    assert_eq!(
        payload(&calls[0]),
        serde_json::json!({ "brightness": 10, "hs_color": [200.0, 60.0], "effect": "colorloop" })
    );

    let target = host.state(TARGET).unwrap();
    assert!(target.is_on());
    assert_eq!(
        target.get_attribute(ATTR_COLOR_MODE).and_then(|v| v.as_str()),
        Some("hs")
    );
}

#[tokio::test]
async fn should_restore_primary_only_when_toggle_turns_off() {
    let host = host_with_lamp().await;
    let mut manager = manager_with_link(&host).await;

    manager
        .handle_service_call(&call("turn_on", TOGGLE, serde_json::json!({})))
        .await
        .unwrap();
    manager
        .handle_service_call(&call(
            "turn_on",
            PRIMARY,
            serde_json::json!({ "brightness": 255, "rgb_color": [1, 2, 3] }),
        ))
        .await
        .unwrap();
    host.clear_service_calls();

    manager
        .handle_service_call(&call("turn_off", TOGGLE, serde_json::json!({})))
        .await
        .unwrap();

    let calls = forwarded(&host);
    assert_eq!(calls.len(), 1);
    assert_eq!(
        payload(&calls[0]),
        serde_json::json!({ "brightness": 255, "rgb_color": [1, 2, 3] })
    );
}

#[tokio::test]
async fn should_send_bare_turn_off_when_activated_proxy_is_off() {
    let host = host_with_lamp().await;
    let mut manager = manager_with_link(&host).await;
    manager
        .handle_service_call(&call("turn_on", PRIMARY, serde_json::json!({})))
        .await
        .unwrap();
    host.clear_service_calls();

    manager
        .handle_service_call(&call("toggle", TOGGLE, serde_json::json!({})))
        .await
        .unwrap();

    let calls = forwarded(&host);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service, "turn_off");
    assert_eq!(payload(&calls[0]), serde_json::json!({}));
    assert_eq!(host.state(TARGET).unwrap().state, EntityState::Off);
}

#[tokio::test]
async fn should_reach_same_state_when_turned_off_twice() {
    let host = host_with_lamp().await;
    let mut manager = manager_with_link(&host).await;
    manager
        .handle_service_call(&call("turn_on", PRIMARY, serde_json::json!({ "brightness": 5 })))
        .await
        .unwrap();

    manager
        .handle_service_call(&call("turn_off", PRIMARY, serde_json::json!({})))
        .await
        .unwrap();
    let proxy_once = host.state(PRIMARY).unwrap();
    let target_once = host.state(TARGET).unwrap();

    manager
        .handle_service_call(&call("turn_off", PRIMARY, serde_json::json!({})))
        .await
        .unwrap();
    assert!(host.state(PRIMARY).unwrap().same_content(&proxy_once));
    assert!(host.state(TARGET).unwrap().same_content(&target_once));
}

#[tokio::test]
async fn should_set_up_with_warning_when_target_unavailable() {
    let (logs, _guard) = capture_logs();
    let host = Arc::new(InMemoryHost::default());

    let mut manager = LinkManager::new(Arc::clone(&host));
    manager.add_entry(entry()).await.unwrap();

    let output = logs.contents();
    assert!(output.contains("WARN"));
    assert!(output.contains("source light not available yet"));

    let proxy = host.state(PRIMARY).unwrap();
    assert_eq!(
        proxy
            .get_attribute(ATTR_SUPPORTED_COLOR_MODES)
            .and_then(|v| v.decode::<Vec<String>>()),
        Some(vec!["onoff".to_string()])
    );
}

#[tokio::test]
async fn should_keep_restored_color_temp_modes_over_target() {
    let host = host_with_lamp().await;
    let last = Entity::builder()
        .entity_id(PRIMARY)
        .state(EntityState::Off)
        .attribute(ATTR_SUPPORTED_COLOR_MODES, serde_json::json!(["color_temp"]))
        .build()
        .unwrap();
    host.save_state(last).await.unwrap();

    let _manager = manager_with_link(&host).await;

    let proxy = host.state(PRIMARY).unwrap();
    assert_eq!(
        proxy
            .get_attribute(ATTR_SUPPORTED_COLOR_MODES)
            .and_then(|v| v.decode::<Vec<String>>()),
        Some(vec!["color_temp".to_string()])
    );
    let other = host.state(OVERRIDE).unwrap();
    assert_eq!(
        other
            .get_attribute(ATTR_SUPPORTED_COLOR_MODES)
            .and_then(|v| v.decode::<Vec<String>>())
            .map(|modes| modes.len()),
        Some(3)
    );
}

#[tokio::test]
async fn should_restore_capabilities_after_restart_without_target() {
    let host = host_with_lamp().await;
    let mut manager = manager_with_link(&host).await;
    manager.unload_all().await.unwrap();
    assert!(host.state(PRIMARY).is_none());

    host.remove_state(TARGET).await.unwrap();
    let mut restarted = LinkManager::new(Arc::clone(&host));
    restarted.add_entry(manager.entries()[0].clone()).await.unwrap();

    let proxy = host.state(PRIMARY).unwrap();
    assert_eq!(
        proxy
            .get_attribute(ATTR_SUPPORTED_COLOR_MODES)
            .and_then(|v| v.decode::<Vec<String>>())
            .map(|modes| modes.len()),
        Some(3)
    );
    assert!(!host.state(TOGGLE).unwrap().is_on());
}

#[tokio::test]
async fn should_log_and_swallow_forwarding_failures() {
    let host = host_with_lamp().await;
    let mut manager = manager_with_link(&host).await;
    host.mark_unavailable(TARGET).await.unwrap();

    let (logs, _guard) = capture_logs();
    let result = manager
        .handle_service_call(&call("turn_on", PRIMARY, serde_json::json!({ "brightness": 1 })))
        .await;

    assert!(result.is_ok());
    assert!(host.state(PRIMARY).unwrap().is_on());
    assert_eq!(forwarded(&host).len(), 1);
    assert!(logs.contents().contains("failed to forward to source light"));
}

#[tokio::test]
async fn should_remove_everything_when_entry_deleted() {
    let host = host_with_lamp().await;
    let mut manager = LinkManager::new(Arc::clone(&host));
    let entry_id = manager.add_entry(entry()).await.unwrap();

    manager.remove_entry(entry_id).await.unwrap();

    for entity_id in [TOGGLE, PRIMARY, OVERRIDE] {
        assert!(host.state(entity_id).is_none());
        assert!(host.registry_record(entity_id).is_none());
        assert!(host.saved_state(entity_id).is_none());
    }
    assert!(host.state(TARGET).is_some());
}

#[tokio::test]
async fn should_retarget_after_options_change() {
    let host = host_with_lamp().await;
    host.add_virtual_light(&VirtualLightConfig {
        entity_id: "light.shelf".to_string(),
        name: "Shelf".to_string(),
        ..VirtualLightConfig::default()
    })
    .await
    .unwrap();
    let mut manager = LinkManager::new(Arc::clone(&host));
    let entry_id = manager.add_entry(entry()).await.unwrap();

    let mut options = ConfigMap::new();
    options.insert(CONF_SOURCE_ENTITY_ID.to_string(), "light.shelf".into());
    manager.options_flow(entry_id, Some(&options)).await.unwrap();
    host.clear_service_calls();

    manager
        .handle_service_call(&call("turn_on", PRIMARY, serde_json::json!({})))
        .await
        .unwrap();

    let calls = host.service_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].entity_id, "light.shelf");
    assert!(host.state("light.shelf").unwrap().is_on());
    assert!(host.get_state(TARGET).await.unwrap().is_some_and(|lamp| !lamp.is_on()));
}
