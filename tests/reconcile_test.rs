use serde_json::json;
use trip_agent_rs::{
    extract_required_attractions, reconcile, reconcile::salvage, ActivityKind, PlannerError,
    Reconciler, RequiredEntitySet,
};

const TOKYO_PLAN: &str = r#"{
  "destination": "东京",
  "days": 2,
  "itinerary": [
    {
      "day": 1,
      "theme": "下町漫步",
      "activities": [
        {"name": "浅草寺", "type": "attraction", "coordinates": [139.7967, 35.7148], "ticket_price": 0},
        {"name": "东京晴空塔", "type": "attraction", "coordinates": [139.8107, 35.7101], "ticket_price": 2100}
      ]
    },
    {
      "day": 2,
      "theme": "都心",
      "activities": [
        {"name": "东京塔", "type": "attraction", "coordinates": [139.7454, 35.6586], "ticket_price": 1200},
        {"name": "银座购物", "type": "shopping"}
      ]
    }
  ],
  "suggestions": "建议购买西瓜卡。",
  "total_cost": 8000
}"#;

fn nothing_required() -> RequiredEntitySet {
    RequiredEntitySet::new()
}

#[test]
fn test_wrapped_and_plain_responses_reconcile_identically() {
    let plain = reconcile(TOKYO_PLAN, &nothing_required(), "").unwrap();

    let fenced = format!("```json\n{TOKYO_PLAN}\n```");
    let chatty = format!("好的！以下是为您定制的行程：\n\n```json\n{TOKYO_PLAN}\n```\n\n祝您旅途愉快！");
    let prose_only = format!("以下是行程：{TOKYO_PLAN} 希望对您有帮助。");

    for wrapped in [fenced, chatty, prose_only] {
        assert_eq!(reconcile(&wrapped, &nothing_required(), "").unwrap(), plain);
    }

    assert_eq!(plain.destination, "东京");
    assert_eq!(plain.day_count(), 2);
    assert_eq!(plain.total_cost, Some(8000.0));
    assert_eq!(plain.itinerary[1].activities[1].kind, ActivityKind::Shopping);
}

#[test]
fn test_stored_plan_round_trips() {
    let first = reconcile(TOKYO_PLAN, &nothing_required(), "").unwrap();
    let stored = serde_json::to_string(&first.to_trip_plan()).unwrap();
    let second = reconcile(&stored, &nothing_required(), "").unwrap();

    assert_eq!(second.itinerary, first.itinerary);
    assert_eq!(second.suggestions, first.suggestions);
    assert_eq!(second.destination, first.destination);
}

#[test]
fn test_double_encoded_response() {
    let encoded = serde_json::to_string(TOKYO_PLAN).unwrap();
    assert!(encoded.starts_with('"'));

    let result = reconcile(&encoded, &nothing_required(), "").unwrap();
    assert_eq!(result, reconcile(TOKYO_PLAN, &nothing_required(), "").unwrap());
}

#[test]
fn test_raw_control_characters_are_repaired() {
    let raw = "{\"destination\":\"京都\",\"itinerary\":[{\"day\":1,\"activities\":[{\"name\":\"清水寺\",\"tips\":\"早上去\n人少\tcool\"}]}]}";
    assert!(serde_json::from_str::<serde_json::Value>(raw).is_err());

    let result = reconcile(raw, &nothing_required(), "").unwrap();
    let tips = result.itinerary[0].activities[0].tips.as_deref().unwrap();
    assert_eq!(tips, "早上去\n人少\tcool");
}

#[test]
fn test_truncated_response_keeps_complete_days() {
    let raw = r#"{"destination":"东京","itinerary":[{"day":1,"activities":[{"name":"东京塔","type":"attraction"}]},{"day":2,"activities":[{"name":"浅草寺","type":"attraction"}]},{"day":3,"activities":[{"name":"上野公"#;

    let result = reconcile(raw, &nothing_required(), "").unwrap();
    let days: Vec<Option<u32>> = result.itinerary.iter().map(|day| day.day).collect();
    assert_eq!(days, vec![Some(1), Some(2)]);
    assert_eq!(result.itinerary[1].activities[0].name, "浅草寺");
}

#[test]
fn test_missing_attraction_adds_warning_without_blocking() {
    let required = extract_required_attractions("一定要去东京塔和明治神宫");
    assert_eq!(required.as_slice(), ["东京塔", "明治神宫"]);

    let result = reconcile(TOKYO_PLAN, &required, "").unwrap();
    assert_eq!(result.missing_entities, vec!["明治神宫"]);
    assert!(result.has_coverage_gap());
    assert!(result.suggestions.starts_with("建议购买西瓜卡。"));
    assert!(result.suggestions.contains("明治神宫"));
    assert!(!result.suggestions.contains("东京塔"));
}

#[test]
fn test_second_landmark_in_a_clause_is_checked() {
    let required = extract_required_attractions("去杭州西湖边的雷峰塔和灵隐寺");
    let raw = r#"{"destination":"杭州","itinerary":[{"day":1,"activities":[{"name":"杭州西湖游船"},{"name":"灵隐寺"}]}]}"#;

    let result = reconcile(raw, &required, "").unwrap();
    assert_eq!(result.missing_entities, vec!["雷峰塔"]);
    assert!(result.suggestions.contains("雷峰塔"));
}

#[test]
fn test_alias_in_itinerary_covers_landmark() {
    let required = extract_required_attractions("maybe something near big ben");
    let raw = r#"{"destination":"London","itinerary":[{"day":1,"activities":[{"name":"Big Ben"},{"name":"Westminster Abbey"}]}]}"#;

    let result = reconcile(raw, &required, "").unwrap();
    assert!(result.missing_entities.is_empty(), "{:?}", result.missing_entities);
    assert_eq!(result.suggestions, trip_agent_rs::reconcile::DEFAULT_PLACEHOLDER_SUGGESTIONS);
}

#[test]
fn test_covered_attractions_leave_suggestions_untouched() {
    let required = extract_required_attractions("想去东京塔，还有浅草寺");
    let result = reconcile(TOKYO_PLAN, &required, "").unwrap();
    assert!(result.missing_entities.is_empty());
    assert_eq!(result.suggestions, "建议购买西瓜卡。");
}

#[test]
fn test_unrecoverable_text_is_the_only_hard_failure() {
    let raw = "抱歉，我暂时无法为您生成行程。".repeat(30);
    let err = reconcile(&raw, &nothing_required(), "东京").unwrap_err();

    match &err {
        PlannerError::Format { snippet, .. } => {
            assert!(snippet.chars().count() <= 201);
            assert!(raw.starts_with(snippet.trim_end_matches('…')));
        }
        other => panic!("expected a format error, got {other:?}"),
    }
    assert!(!err.is_retryable());
    assert!(err.user_message().contains("retry or simplify"));
}

#[test]
fn test_sparse_object_gets_defaults() {
    let result = reconcile(r#"{"itinerary":[{"activities":["外滩"]},{}]}"#, &nothing_required(), "上海").unwrap();
    assert_eq!(result.destination, "上海");
    assert_eq!(result.suggestions, trip_agent_rs::reconcile::DEFAULT_PLACEHOLDER_SUGGESTIONS);
    let days: Vec<Option<u32>> = result.itinerary.iter().map(|day| day.day).collect();
    assert_eq!(days, vec![Some(1), Some(2)]);
    assert_eq!(result.itinerary[0].activities[0].name, "外滩");
}

#[test]
fn test_custom_placeholder_and_contract_toggle() {
    let reconciler = Reconciler::new()
        .with_placeholder_suggestions("No tips yet")
        .with_contract_checks(false);
    let raw = json!({
        "destination": "Paris",
        "itinerary": [{"day": 1, "activities": [{"name": "Louvre", "ticket_price": "free"}]}]
    })
    .to_string();

    let result = reconciler.reconcile(&raw, &nothing_required(), "").unwrap();
    assert_eq!(result.suggestions, "No tips yet");
    assert!(result.contract_issues.is_empty());

    let checked = Reconciler::new().reconcile(&raw, &nothing_required(), "").unwrap();
    assert_eq!(checked.contract_issues.len(), 1);
}

#[test]
fn test_unwrap_stages_are_idempotent() {
    let fenced = format!("```json\n{TOKYO_PLAN}\n```");
    let once = salvage::strip_code_fence(&fenced);
    assert_eq!(salvage::strip_code_fence(once), once);

    let isolated = salvage::isolate_object(once);
    assert_eq!(salvage::isolate_object(isolated), isolated);

    let escaped = salvage::escape_control_chars("{\"a\":\"x\ny\"}");
    assert_eq!(salvage::escape_control_chars(&escaped), escaped);
}
