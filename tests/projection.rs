//! Integration tests for catalog projection: stations, guide, and their
//! interaction with the shared catalog cache.
//!
//! Each test runs its own mock upstream serving `getfeed.php` and
//! `epg/query.php`.

use std::sync::Arc;

use distrotv_bridge::feed::{build_client, FeedStore};
use distrotv_bridge::output::{Playlist, XmltvDocument};
use distrotv_bridge::projector::Projector;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn live_show(name: &str, url: &str, epg_id: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "live",
        "name": name,
        "title": format!(" {} ", name.to_uppercase()),
        "description": format!("{name} live "),
        "img_logo": format!("https://img/{name}.png"),
        "genre": "",
        "keywords": "News,Daily",
        "seasons": [{"episodes": [{"id": epg_id, "content": {"url": url}}]}]
    })
}

async fn mount_catalog(server: &MockServer, catalog: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/tv_v5/getfeed.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog))
        .mount(server)
        .await;
}

fn projector_for(server: &MockServer) -> Projector {
    let client = build_client().unwrap();
    let store = Arc::new(FeedStore::new(
        client.clone(),
        format!("{}/tv_v5/getfeed.php", server.uri()),
    ));
    Projector::new(store, client, format!("{}/epg/query.php", server.uri()))
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_single_channel_end_to_end() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        json!({
            "topics": [],
            "shows": {"cnn": live_show("cnn", "https://s/cnn.ts?x=1", json!("42"))}
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/epg/query.php"))
        .and(query_param("id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "epg": {"42": {"slots": [
                {"start": "2024-03-01 00:00:00", "end": "2024-03-01 01:00:00", "title": "News"}
            ]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let projector = projector_for(&server);

    let stations = projector.list_channels().await.unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].id, "cnn");
    assert_eq!(stations[0].url, "https://s/cnn.ts");
    assert_eq!(stations[0].name, "CNN");
    assert_eq!(stations[0].description, "cnn live");

    let guide = projector.build_epg().await.unwrap();
    assert_eq!(guide.channels.len(), 1);
    assert_eq!(guide.channels[0].id, "cnn");
    assert_eq!(guide.programmes.len(), 1);

    let expected = r#"<tv source-info-name="distrotv" generator-info-name="vlc-bridge">
  <channel id="cnn">
    <display-name>CNN</display-name>
  </channel>
  <programme start="20240301000000 +0000" stop="20240301010000 +0000" channel="cnn">
    <title>News</title>
  </programme>
</tv>
"#;
    assert_eq!(guide.to_xml().unwrap(), expected);

    let playlist = Playlist::new(&stations).render();
    assert_eq!(
        playlist,
        "#EXTM3U\n\
#EXTINF:-1 channel-id=\"cnn\" tvg-id=\"cnn\" tvg-logo=\"https://img/cnn.png\" tvg-description=\"cnn live\" group-title=\"News\",CNN\n\
https://s/cnn.ts\n"
    );
}

#[tokio::test]
async fn test_channels_and_guide_share_one_catalog_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tv_v5/getfeed.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "topics": [],
            "shows": {"cnn": live_show("cnn", "https://s/cnn.ts", json!(1))}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/epg/query.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"epg": {}})))
        .mount(&server)
        .await;

    let projector = projector_for(&server);
    let (stations, guide) = tokio::join!(projector.list_channels(), projector.build_epg());

    assert_eq!(stations.unwrap().len(), 1);
    let guide = guide.unwrap();
    assert_eq!(guide.channels.len(), 1);
    assert!(guide.programmes.is_empty());
}

// ============================================================================
// Channel listing
// ============================================================================

#[tokio::test]
async fn test_only_live_shows_become_stations() {
    let server = MockServer::start().await;
    let mut vod = live_show("movie", "https://s/movie.mp4", json!(2));
    vod["type"] = json!("vod");
    mount_catalog(
        &server,
        json!({
            "topics": [{"type": "live"}, {"type": "vod"}],
            "shows": {
                "news": live_show("news", "https://s/news.m3u8", json!(1)),
                "movie": vod,
                "sports": live_show("sports", "https://s/sports.m3u8", json!(3))
            }
        }),
    )
    .await;

    let stations = projector_for(&server).list_channels().await.unwrap();
    let ids: Vec<_> = stations.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["news", "sports"]);
}

#[tokio::test]
async fn test_incomplete_show_skipped_without_aborting() {
    let server = MockServer::start().await;
    let mut no_logo = live_show("nologo", "https://s/a.m3u8", json!(1));
    no_logo.as_object_mut().unwrap().remove("img_logo");
    let mut no_stream = live_show("nostream", "https://s/b.m3u8", json!(2));
    no_stream["seasons"] = json!([]);

    mount_catalog(
        &server,
        json!({
            "topics": [],
            "shows": {
                "nologo": no_logo,
                "nostream": no_stream,
                "good": live_show("good", "https://s/good.m3u8?token=abc", json!(3))
            }
        }),
    )
    .await;

    let stations = projector_for(&server).list_channels().await.unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].id, "good");
    assert_eq!(stations[0].url, "https://s/good.m3u8");
}

#[tokio::test]
async fn test_unusual_episode_id_still_listed_but_left_out_of_guide() {
    let server = MockServer::start().await;
    let mut show = live_show("cnn", "https://s/cnn.ts", json!(false));
    show["seasons"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::Value::Null);
    mount_catalog(
        &server,
        json!({
            "topics": [{"type": "live", "title": {"en": "Live"}}],
            "shows": {"cnn": show}
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/epg/query.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"epg": {}})))
        .expect(0)
        .mount(&server)
        .await;

    let projector = projector_for(&server);

    let stations = projector.list_channels().await.unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].url, "https://s/cnn.ts");

    let guide = projector.build_epg().await.unwrap();
    assert!(guide.is_empty());
}

#[tokio::test]
async fn test_catalog_failure_reported_to_both_operations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tv_v5/getfeed.php"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2) // cache is cleared after each failure
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/epg/query.php"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let projector = projector_for(&server);

    let err = projector.list_channels().await.unwrap_err();
    assert!(err.to_string().contains("Failed to load channel catalog"));
    assert!(projector.build_epg().await.is_err());
}

// ============================================================================
// Guide
// ============================================================================

#[tokio::test]
async fn test_no_epg_ids_skips_epg_query() {
    let server = MockServer::start().await;
    let mut show = live_show("cnn", "https://s/cnn.ts", json!(""));
    show["seasons"][0]["episodes"][0]
        .as_object_mut()
        .unwrap()
        .remove("id");
    mount_catalog(&server, json!({"topics": [], "shows": {"cnn": show}})).await;
    Mock::given(method("GET"))
        .and(path("/epg/query.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"epg": {}})))
        .expect(0)
        .mount(&server)
        .await;

    let guide = projector_for(&server).build_epg().await.unwrap();
    assert_eq!(guide, XmltvDocument::default());
    assert_eq!(guide.to_xml().unwrap(), "");
}

#[tokio::test]
async fn test_epg_query_failure_yields_empty_guide() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        json!({"topics": [], "shows": {"cnn": live_show("cnn", "https://s/cnn.ts", json!("42"))}}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/epg/query.php"))
        .respond_with(ResponseTemplate::new(504))
        .expect(1)
        .mount(&server)
        .await;

    let guide = projector_for(&server).build_epg().await.unwrap();
    assert!(guide.is_empty());
}

#[tokio::test]
async fn test_epg_query_lists_all_ids() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        json!({
            "topics": [],
            "shows": {
                "a": live_show("a", "https://s/a.ts", json!("10")),
                "b": live_show("b", "https://s/b.ts", json!(20)),
                "c": live_show("c", "https://s/c.ts", json!("30"))
            }
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/epg/query.php"))
        .and(query_param("id", "10,20,30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "epg": {
                "20": {"slots": [
                    {"start": "2024-03-01 00:00:00", "end": "2024-03-01 00:30:00", "title": "B1"},
                    {"start": "2024-03-01 00:30:00", "end": "not a time", "title": "B2"}
                ]},
                "10": {"slots": [
                    {"start": "2024-03-01 00:00:00", "end": "2024-03-01 02:00:00", "title": "A1"}
                ]}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let guide = projector_for(&server).build_epg().await.unwrap();
    assert_eq!(guide.channels.len(), 3);

    let programmes: Vec<_> = guide
        .programmes
        .iter()
        .map(|p| (p.channel_id.as_str(), p.title.as_str()))
        .collect();
    assert_eq!(programmes, vec![("a", "A1"), ("b", "B1")]);
}

#[tokio::test]
async fn test_php_style_empty_epg_keeps_channels() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        json!({"topics": [], "shows": {"cnn": live_show("cnn", "https://s/cnn.ts", json!("42"))}}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/epg/query.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"epg": []})))
        .mount(&server)
        .await;

    let guide = projector_for(&server).build_epg().await.unwrap();
    assert_eq!(guide.channels.len(), 1);
    assert!(guide.programmes.is_empty());
    assert!(guide.to_xml().unwrap().contains(r#"<channel id="cnn">"#));
}
