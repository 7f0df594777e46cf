//! Action resolution integration tests.
//!
//! Configurations here are built in code rather than JSON to exercise the
//! builder API and inline fallbacks.

use std::sync::Arc;

use parking_lot::Mutex;

use moment_engine::actions::{
    Action, ActionKind, ActionRef, AlertAction, BannerAction, ConditionalAction, DispatchKind,
    HostCapabilities, LinkAction, ModalAction, Outcome, MAX_RESOLUTION_DEPTH,
};
use moment_engine::condition::Condition;
use moment_engine::core::{EngineConfig, StaticConfigSource, Theme};
use moment_engine::engine::Engine;
use moment_engine::error::{EngineError, HostError};
use moment_engine::properties::PropertyTables;
use moment_engine::triggers::Trigger;

// === Recording Host ===

#[derive(Default)]
struct RecordingHost {
    calls: Mutex<Vec<String>>,
    fail_banners: bool,
}

impl RecordingHost {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

impl HostCapabilities for RecordingHost {
    fn show_banner(&self, banner: &BannerAction) -> Result<(), HostError> {
        if self.fail_banners {
            return Err(HostError::new("no window to attach to"));
        }
        self.record(format!("banner:{}", banner.body));
        Ok(())
    }

    fn show_alert(&self, alert: &AlertAction) -> Result<(), HostError> {
        self.record(format!("alert:{}", alert.title));
        Ok(())
    }

    fn show_link(&self, link: &LinkAction) -> Result<(), HostError> {
        self.record(format!("link:{}", link.url));
        Ok(())
    }

    fn show_modal(&self, modal: &ModalAction) -> Result<(), HostError> {
        self.record(format!("modal:{}", modal.title));
        Ok(())
    }

    fn show_review_prompt(&self) -> Result<(), HostError> {
        self.record("review".to_string());
        Ok(())
    }

    fn set_default_theme(&self, _theme: &Theme) -> Result<(), HostError> {
        Ok(())
    }

    fn can_open_url(&self, _url: &str) -> bool {
        false
    }
}

// === Helpers ===

fn cond(source: &str) -> Condition {
    Condition::parse(source).unwrap()
}

fn banner(body: &str) -> Action {
    Action::new(ActionKind::Banner(BannerAction::new(body)))
}

fn alert(title: &str) -> Action {
    Action::new(ActionKind::Alert(AlertAction::new(title)))
}

fn start(config: EngineConfig, host: Arc<RecordingHost>) -> Engine {
    let mut engine = Engine::with_property_tables(PropertyTables::empty());
    engine.set_host(host);
    engine.set_config_source(StaticConfigSource::signed(config));
    engine.start(false).unwrap();
    engine
}

/// Build `hop_0 -> hop_1 -> ... -> hop_{n-1} -> target` from future actions.
fn future_chain(config: EngineConfig, hops: usize, target: &str) -> EngineConfig {
    (0..hops).fold(config, |config, i| {
        let next = if i + 1 == hops {
            target.to_string()
        } else {
            format!("hop_{}", i + 1)
        };
        config.with_action(
            format!("hop_{i}"),
            Action::future(format!("type_from_v{i}"), Some(ActionRef::from(next))),
        )
    })
}

// === Fallback Chains ===

/// An inline fallback is used without any named lookup.
#[test]
fn test_inline_fallback() {
    let host = Arc::new(RecordingHost::default());
    let config = EngineConfig::new("app").with_action(
        "carousel",
        Action::future("carousel", Some(ActionRef::from(banner("inline fallback")))),
    );
    let engine = start(config, Arc::clone(&host));

    assert_eq!(
        engine.perform_named_action("carousel"),
        Ok(Outcome::Dispatched(DispatchKind::Banner))
    );
    assert_eq!(host.calls(), vec!["banner:inline fallback"]);
}

/// The longest permitted chain resolves; one more hop does not.
#[test]
fn test_fallback_depth_limit() {
    let host = Arc::new(RecordingHost::default());
    let config = EngineConfig::new("app").with_action("target", alert("end of chain"));
    let config = future_chain(config, MAX_RESOLUTION_DEPTH, "target");
    let engine = start(config, Arc::clone(&host));
    assert!(engine.perform_named_action("hop_0").unwrap().is_dispatched());
    assert_eq!(host.calls(), vec!["alert:end of chain"]);

    let host = Arc::new(RecordingHost::default());
    let config = EngineConfig::new("app").with_action("target", alert("end of chain"));
    let config = future_chain(config, MAX_RESOLUTION_DEPTH + 1, "target");
    let engine = start(config, Arc::clone(&host));
    assert!(matches!(
        engine.perform_named_action("hop_0"),
        Err(EngineError::UnsupportedActionType(_))
    ));
    assert!(host.calls().is_empty());
}

/// Self-referencing fallbacks terminate with an error.
#[test]
fn test_fallback_cycle_terminates() {
    let host = Arc::new(RecordingHost::default());
    let config = EngineConfig::new("app")
        .with_action("ping", Action::future("ping_type", Some(ActionRef::from("pong"))))
        .with_action("pong", Action::future("pong_type", Some(ActionRef::from("ping"))));
    let engine = start(config, Arc::clone(&host));

    assert!(matches!(
        engine.perform_named_action("ping"),
        Err(EngineError::UnsupportedActionType(_))
    ));
    assert!(host.calls().is_empty());
}

/// A fallback naming a missing action reports it at dispatch time.
#[test]
fn test_dangling_fallback_name() {
    let host = Arc::new(RecordingHost::default());
    let config = EngineConfig::new("app")
        .with_action("orphan", Action::future("vr", Some(ActionRef::from("gone"))));
    let engine = start(config, Arc::clone(&host));

    assert_eq!(
        engine.perform_named_action("orphan"),
        Err(EngineError::action_not_found("gone"))
    );
}

/// A guard on the future action itself gates the whole chain.
#[test]
fn test_guard_on_future_action() {
    let host = Arc::new(RecordingHost::default());
    let config = EngineConfig::new("app")
        .with_action("fallback", alert("fallback"))
        .with_action(
            "gated",
            Action::future("vr", Some(ActionRef::from("fallback"))).with_condition(cond("false")),
        );
    let engine = start(config, Arc::clone(&host));

    assert_eq!(engine.perform_named_action("gated"), Ok(Outcome::Skipped));
    assert!(host.calls().is_empty());
}

// === Conditionals ===

/// Nested conditionals resolve to exactly one host call.
#[test]
fn test_nested_conditionals() {
    let host = Arc::new(RecordingHost::default());
    let inner = Action::new(ActionKind::Conditional(
        ConditionalAction::new(cond("'b' in ['a', 'b']"), "review").with_failed("banner"),
    ));
    let config = EngineConfig::new("app")
        .with_action("review", Action::new(ActionKind::ReviewPrompt))
        .with_action("banner", banner("not reached"))
        .with_action(
            "outer",
            Action::new(ActionKind::Conditional(
                ConditionalAction::new(cond("1 + 1 == 2"), inner).with_failed("banner"),
            )),
        );
    let engine = start(config, Arc::clone(&host));

    assert_eq!(
        engine.perform_named_action("outer"),
        Ok(Outcome::Dispatched(DispatchKind::ReviewPrompt))
    );
    assert_eq!(host.calls(), vec!["review"]);
}

/// A branch whose own guard is false ends the resolution without dispatch.
#[test]
fn test_branch_guard_false() {
    let host = Arc::new(RecordingHost::default());
    let config = EngineConfig::new("app")
        .with_action("guarded", alert("guarded").with_condition(cond("2 < 1")))
        .with_action(
            "pick",
            Action::new(ActionKind::Conditional(ConditionalAction::new(
                cond("true"),
                "guarded",
            ))),
        );
    let engine = start(config, Arc::clone(&host));

    assert_eq!(engine.perform_named_action("pick"), Ok(Outcome::Skipped));
    assert!(host.calls().is_empty());
}

/// Evaluation errors in a branch condition surface to the caller.
#[test]
fn test_conditional_evaluation_error() {
    let host = Arc::new(RecordingHost::default());
    let config = EngineConfig::new("app").with_action(
        "broken",
        Action::new(ActionKind::Conditional(ConditionalAction::new(
            cond("1 / 0 > 1"),
            "anything",
        ))),
    );
    let engine = start(config, Arc::clone(&host));

    assert!(matches!(
        engine.perform_named_action("broken"),
        Err(EngineError::ConditionEvaluation(_))
    ));
}

// === Host Failures ===

/// A host failure is returned and does not trigger a fallback.
#[test]
fn test_host_error_propagates() {
    let host = Arc::new(RecordingHost {
        fail_banners: true,
        ..RecordingHost::default()
    });
    let config = EngineConfig::new("app")
        .with_action("b", banner("hi"))
        .with_trigger(Trigger::new("opened", "b"));
    let mut engine = start(config, Arc::clone(&host));

    assert_eq!(
        engine.perform_named_action("b"),
        Err(EngineError::Host(HostError::new("no window to attach to")))
    );
    assert!(matches!(engine.send_event("opened"), Err(EngineError::Host(_))));
    // The event was still recorded
    assert_eq!(engine.event_count("opened"), 1);
}

// === Serialization ===

/// A built configuration survives a JSON round trip with the same behavior.
#[test]
fn test_config_json_round_trip_dispatches_same() {
    let config = EngineConfig::new("app")
        .with_action("fallback", alert("from fallback"))
        .with_action("future", Action::future("ar_overlay", Some(ActionRef::from("fallback"))))
        .with_trigger(Trigger::new("go", "future").with_condition(cond("eventCount('go') > 0")));

    let json = serde_json::to_string(&config).unwrap();
    let parsed = EngineConfig::from_json(&json).unwrap();
    assert_eq!(parsed, config);

    let host = Arc::new(RecordingHost::default());
    let mut engine = start(parsed, Arc::clone(&host));
    engine.send_event("go").unwrap();
    assert_eq!(host.calls(), vec!["alert:from fallback"]);
}
