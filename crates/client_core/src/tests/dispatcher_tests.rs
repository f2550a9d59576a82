use super::*;

const LATTE: &[u8] = br#"{"type":"order_saved","data":{"drinkType":"Latte","size":"Grande","milk":"Oat","extras":["Vanilla"],"name":"Sam","price":350}}"#;

fn image(url: &str, prompt: &str) -> Vec<u8> {
    serde_json::json!({ "type": "image", "data": { "url": url, "prompt": prompt } })
        .to_string()
        .into_bytes()
}

#[test]
fn image_event_sets_preview() {
    let dispatcher = AgentEventDispatcher::default();
    let mut state = SessionState::default();

    let outcome = dispatcher.handle(
        &mut state,
        &image("https://cdn.test/a.png", "foam art"),
        Some(AGENT_EVENTS_TOPIC),
    );

    assert!(matches!(outcome, DispatchOutcome::ImageUpdated));
    assert_eq!(
        state.generated_image,
        Some(ImagePreview {
            url: "https://cdn.test/a.png".into(),
            prompt: "foam art".into(),
        })
    );
}

#[test]
fn bom_prefixed_image_event_updates_preview() {
    let dispatcher = AgentEventDispatcher::default();
    let mut state = SessionState::default();
    let mut payload = vec![0xEF, 0xBB, 0xBF];
    payload.extend(image("https://cdn.test/bom.png", "cortado"));

    let outcome = dispatcher.handle(&mut state, &payload, Some(AGENT_EVENTS_TOPIC));

    assert!(matches!(outcome, DispatchOutcome::ImageUpdated));
    let preview = state.generated_image.expect("preview");
    assert_eq!(preview.url, "https://cdn.test/bom.png");
    assert_eq!(preview.prompt, "cortado");
}

#[test]
fn second_image_replaces_first() {
    let dispatcher = AgentEventDispatcher::default();
    let mut state = SessionState::default();

    dispatcher.handle(&mut state, &image("a", "first"), Some(AGENT_EVENTS_TOPIC));
    dispatcher.handle(&mut state, &image("b", "second"), Some(AGENT_EVENTS_TOPIC));

    let preview = state.generated_image.expect("preview");
    assert_eq!(preview.url, "b");
    assert_eq!(preview.prompt, "second");
}

#[test]
fn order_saved_notifies_once_with_unmodified_record() {
    let dispatcher = AgentEventDispatcher::default();
    let mut rx = dispatcher.notifier().subscribe();
    let mut state = SessionState::default();

    let outcome = dispatcher.handle(&mut state, LATTE, Some(AGENT_EVENTS_TOPIC));
    assert!(matches!(
        outcome,
        DispatchOutcome::OrderBroadcast { receivers: 1 }
    ));

    let order = rx.try_recv().expect("one notification");
    assert_eq!(
        order,
        OrderRecord {
            drink_type: "Latte".into(),
            size: "Grande".into(),
            milk: "Oat".into(),
            extras: vec!["Vanilla".into()],
            name: "Sam".into(),
            price: 350.0,
        }
    );
    assert!(rx.try_recv().is_err(), "exactly one notification per event");
    assert_eq!(state, SessionState::default());
}

#[test]
fn other_topics_are_ignored() {
    let dispatcher = AgentEventDispatcher::default();
    let mut rx = dispatcher.notifier().subscribe();
    let mut state = SessionState::default();

    assert!(matches!(
        dispatcher.handle(&mut state, LATTE, Some("lk.chat")),
        DispatchOutcome::OffTopic
    ));
    assert!(matches!(
        dispatcher.handle(&mut state, LATTE, None),
        DispatchOutcome::OffTopic
    ));
    assert!(rx.try_recv().is_err());
}

#[test]
fn malformed_payloads_are_dropped_without_mutation() {
    let dispatcher = AgentEventDispatcher::default();
    let mut rx = dispatcher.notifier().subscribe();
    let mut state = SessionState::default();

    let inputs: [&[u8]; 5] = [
        b"",
        b"not json",
        &[0xc3, 0x28],
        br#"{"type":"image","data":"oops"}"#,
        br#"{"data":{}}"#,
    ];
    for payload in inputs {
        let outcome = dispatcher.handle(&mut state, payload, Some(AGENT_EVENTS_TOPIC));
        assert!(matches!(outcome, DispatchOutcome::Dropped(_)), "{outcome:?}");
        assert!(!outcome.mutated_state());
    }

    assert_eq!(state, SessionState::default());
    assert!(rx.try_recv().is_err());
}

#[test]
fn unknown_type_is_ignored_without_mutation() {
    let dispatcher = AgentEventDispatcher::default();
    let mut rx = dispatcher.notifier().subscribe();
    let mut state = SessionState::default();

    let outcome = dispatcher.handle(
        &mut state,
        br#"{"type":"order_cancelled","data":{"name":"Sam"}}"#,
        Some(AGENT_EVENTS_TOPIC),
    );

    match outcome {
        DispatchOutcome::Ignored { kind } => assert_eq!(kind, "order_cancelled"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(state, SessionState::default());
    assert!(rx.try_recv().is_err());
}

#[test]
fn order_without_listeners_still_counts_as_dispatched() {
    let dispatcher = AgentEventDispatcher::default();
    let mut state = SessionState::default();

    let outcome = dispatcher.handle(&mut state, LATTE, Some(AGENT_EVENTS_TOPIC));
    assert!(matches!(
        outcome,
        DispatchOutcome::OrderBroadcast { receivers: 0 }
    ));
}
