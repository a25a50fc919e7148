mod common;

use common::scripted_client;
use serde_json::json;

fn campaign_page(ids: [&str; 2], next: Option<&str>) -> (u16, String) {
    let data: Vec<_> = ids
        .iter()
        .map(|id| json!({ "id": id, "name": format!("Campaign {}", id), "start_time": "2024-09-01T00:00:00+0000" }))
        .collect();
    let body = match next {
        Some(next) => json!({ "data": data, "paging": { "cursors": { "after": "c" }, "next": next } }),
        None => json!({ "data": data, "paging": { "cursors": { "after": "c" } } }),
    };
    (200, body.to_string())
}

#[tokio::test]
async fn test_campaigns_accumulate_across_three_pages() {
    let (client, log) = scripted_client(vec![
        campaign_page(["1", "2"], Some("https://graph.facebook.com/v21.0/act_1001/campaigns?after=p2")),
        campaign_page(["3", "4"], Some("https://graph.facebook.com/v21.0/act_1001/campaigns?after=p3")),
        campaign_page(["5", "6"], None),
    ]);

    let campaigns = client.get_campaigns_by_name("Spring").await;

    let ids: Vec<&str> = campaigns.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 3);
    assert!(!log[0].1.is_empty());
    // cursor urls are followed verbatim, no parameters added
    assert_eq!(log[1].0, "https://graph.facebook.com/v21.0/act_1001/campaigns?after=p2");
    assert!(log[1].1.is_empty());
    assert!(log[2].1.is_empty());
}

#[tokio::test]
async fn test_adsets_keep_pages_collected_before_a_failure() {
    let (client, log) = scripted_client(vec![
        (
            200,
            json!({
                "data": [{ "id": "a1", "name": "Broad" }, { "id": "a2", "name": "Lookalike" }],
                "paging": { "next": "https://graph.facebook.com/v21.0/77/adsets?after=x" }
            })
            .to_string(),
        ),
        (500, json!({ "error": { "message": "internal" } }).to_string()),
    ]);

    let adsets = client.get_adsets_by_campaign_id("77").await;

    assert_eq!(adsets.len(), 2);
    assert_eq!(adsets[1].name, "Lookalike");
    assert_eq!(log.lock().unwrap()[0].0, "https://graph.facebook.com/v21.0/77/adsets");
}

#[tokio::test]
async fn test_failed_first_page_yields_no_campaigns() {
    let (client, _) = scripted_client(vec![(
        401,
        json!({ "error": { "message": "Invalid OAuth access token" } }).to_string(),
    )]);

    assert!(client.get_campaigns_by_name("anything").await.is_empty());
}
