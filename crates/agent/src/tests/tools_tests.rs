use super::*;
use livekit_integration::{LiveKitRoomEvent, LoopbackConnector};
use serde_json::json;

fn latte() -> SaveOrderArgs {
    SaveOrderArgs {
        drink_type: "Latte".into(),
        size: "Grande".into(),
        milk: "Oat".into(),
        extras: vec!["Vanilla".into()],
        name: "Saam".into(),
    }
}

#[tokio::test]
async fn save_order_publishes_priced_order() {
    let connector = LoopbackConnector::new();
    let agent_room = connector.join("cafe", "agent").await.expect("agent");
    let user_room = connector.join("cafe", "user").await.expect("user");
    let mut user_events = user_room.subscribe_events();

    let tools = BaristaTools::new(Some(agent_room));
    let reply = tools.save_order(latte()).await;
    assert_eq!(reply, "Order saved! Total is ₹330.");

    let LiveKitRoomEvent::DataReceived { payload, topic, kind, .. } =
        user_events.recv().await.expect("event")
    else {
        panic!("expected data packet");
    };
    assert_eq!(topic.as_deref(), Some(AGENT_EVENTS_TOPIC));
    assert_eq!(kind, DataPacketKind::Reliable);

    let Some(AgentEvent::OrderSaved(order)) = AgentEvent::decode(&payload).expect("decode") else {
        panic!("expected order_saved");
    };
    assert_eq!(order.name, "Saam");
    assert_eq!(order.price, 330.0);
}

#[tokio::test]
async fn last_order_is_remembered() {
    let tools = BaristaTools::new(None);
    assert_eq!(
        tools.get_last_order().await,
        "I couldn't find any previous orders."
    );

    tools.save_order(latte()).await;
    assert_eq!(
        tools.get_last_order().await,
        "Found the last order: Grande Latte with Oat milk. Extras: Vanilla."
    );
}

#[tokio::test]
async fn publish_failure_is_reported_to_the_model() {
    let connector = LoopbackConnector::new();
    let agent_room = connector.join("cafe", "agent").await.expect("agent");
    agent_room.leave().await.expect("leave");

    let tools = BaristaTools::new(Some(agent_room));
    let reply = tools.save_order(latte()).await;
    assert!(reply.starts_with("Error saving order:"), "{reply}");
}

#[tokio::test]
async fn invoke_dispatches_by_name() {
    let tools = BaristaTools::new(None);
    let reply = tools
        .invoke(
            "save_order",
            json!({
                "drink_type": "Mocha",
                "size": "Venti",
                "milk": "Almond",
                "extras": [],
                "name": "Jon"
            }),
        )
        .await
        .expect("save");
    assert_eq!(reply, "Order saved! Total is ₹350.");

    let err = tools
        .invoke("save_order", json!({ "size": "Tall" }))
        .await
        .expect_err("missing fields");
    assert!(matches!(err, ToolError::InvalidArguments { tool: "save_order", .. }));

    let err = tools
        .invoke("refund", Value::Null)
        .await
        .expect_err("unknown");
    assert!(matches!(err, ToolError::UnknownTool(name) if name == "refund"));
}

#[tokio::test]
async fn show_image_publishes_image_event() {
    let connector = LoopbackConnector::new();
    let agent_room = connector.join("cafe", "agent").await.expect("agent");
    let user_room = connector.join("cafe", "user").await.expect("user");
    let mut user_events = user_room.subscribe_events();

    let tools = BaristaTools::new(Some(agent_room));
    tools
        .invoke(
            "show_image",
            json!({ "url": "https://cdn.test/mocha.png", "prompt": "iced mocha" }),
        )
        .await
        .expect("show");

    let LiveKitRoomEvent::DataReceived { payload, .. } = user_events.recv().await.expect("event")
    else {
        panic!("expected data packet");
    };
    assert_eq!(
        AgentEvent::decode(&payload).expect("decode"),
        Some(AgentEvent::Image(ImagePreview {
            url: "https://cdn.test/mocha.png".into(),
            prompt: "iced mocha".into(),
        }))
    );
}

#[test]
fn specs_list_every_tool() {
    let names: Vec<_> = BaristaTools::specs().iter().map(|s| s.name).collect();
    assert_eq!(names, ["save_order", "get_last_order", "show_image"]);
}
