//! Live/fallback selection and the fallback client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use contact_desk::config::{RelayConfig, TimingConfig};
use contact_desk::delivery::configured::{ConfiguredClient, DeliveryMode, EnvResolver};
use contact_desk::delivery::fallback::{FallbackClient, DEFAULT_FALLBACK_DELAY};
use contact_desk::delivery::DeliveryClient;
use contact_desk::form::FormFields;

fn resolver(vars: &[(&str, &str)]) -> EnvResolver {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    Arc::new(move |key: &str| map.get(key).cloned())
}

fn client(relay: RelayConfig, vars: &[(&str, &str)]) -> ConfiguredClient {
    match ConfiguredClient::with_resolver(relay, &TimingConfig::default(), resolver(vars)) {
        Ok(client) => client,
        Err(err) => panic!("client should build: {err}"),
    }
}

const ALL_CREDENTIALS: [(&str, &str); 3] = [
    ("CONTACT_DESK_SERVICE_ID", "service_abc"),
    ("CONTACT_DESK_TEMPLATE_ID", "template_xyz"),
    ("CONTACT_DESK_PUBLIC_KEY", "pk_live_123456"),
];

#[test]
fn all_credentials_select_live_mode() {
    let client = client(RelayConfig::default(), &ALL_CREDENTIALS);
    match client.resolve_mode() {
        DeliveryMode::Live(creds) => {
            assert_eq!(creds.service_id, "service_abc");
            assert_eq!(creds.template_id, "template_xyz");
        }
        DeliveryMode::Fallback => panic!("expected live mode"),
    }
    assert_eq!(client.mode(), "live");
}

#[test]
fn any_missing_credential_selects_fallback() {
    for skip in 0..ALL_CREDENTIALS.len() {
        let vars: Vec<(&str, &str)> = ALL_CREDENTIALS
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, kv)| *kv)
            .collect();
        let client = client(RelayConfig::default(), &vars);
        assert_eq!(client.resolve_mode(), DeliveryMode::Fallback);
    }
}

#[test]
fn blank_credential_counts_as_missing() {
    let vars = [
        ("CONTACT_DESK_SERVICE_ID", "service_abc"),
        ("CONTACT_DESK_TEMPLATE_ID", ""),
        ("CONTACT_DESK_PUBLIC_KEY", "pk_live_123456"),
    ];
    let client = client(RelayConfig::default(), &vars);
    assert_eq!(client.resolve_mode(), DeliveryMode::Fallback);
}

#[test]
fn custom_variable_names_are_honoured() {
    let relay = RelayConfig {
        service_id_env: "MY_SERVICE".to_owned(),
        template_id_env: "MY_TEMPLATE".to_owned(),
        public_key_env: "MY_KEY".to_owned(),
        ..RelayConfig::default()
    };
    let vars = [("MY_SERVICE", "s"), ("MY_TEMPLATE", "t"), ("MY_KEY", "k")];
    let client = client(relay, &vars);
    assert_eq!(client.resolve_mode().label(), "live");
}

#[tokio::test(start_paused = true)]
async fn fallback_mode_succeeds_after_fixed_delay() {
    let client = client(RelayConfig::default(), &[]);
    let start = Instant::now();
    let result = client.send(&FormFields::default()).await;
    assert!(result.is_ok());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(500), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(600), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn fallback_client_reports_success() {
    let fallback = FallbackClient::default();
    assert_eq!(fallback.delay(), DEFAULT_FALLBACK_DELAY);
    assert_eq!(fallback.mode(), "fallback");

    let start = Instant::now();
    assert!(fallback.send(&FormFields::default()).await.is_ok());
    assert!(start.elapsed() >= DEFAULT_FALLBACK_DELAY);
}
