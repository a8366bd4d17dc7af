use std::sync::Arc;
use std::time::Duration;

use httpmock::MockServer;
use penna::application::editor::{CommandOutcome, EditorSession, MediaTarget};
use penna::application::media_picker::{MediaPicker, MediaPickerSettings, PageOutcome};
use penna::application::post_form::{PostFormController, SaveOutcome};
use penna::application::repos::{MediaRepo, PostsRepo, UploadFile};
use penna::domain::blocks::{NewBlock, Placement};
use penna::domain::bullet::{BULLET_ICON_PROP, BULLET_TYPE_PROP};
use penna::domain::commands::{CommandMenu, MEDIA_LIBRARY_KEY};
use penna::domain::kinds;
use penna::domain::media::MimeAllowList;
use penna::domain::posts::PostForm;
use penna::infra::http::ApiClient;
use penna::presentation::blocks::{render_snapshot, standard_registry};
use reqwest::Url;

fn client(server: &MockServer) -> Arc<ApiClient> {
    let base = Url::parse(&server.url("/api/")).expect("base url");
    Arc::new(ApiClient::new(base, Duration::from_secs(5), None).expect("client"))
}

fn media_item(id: &str, name: &str, mime: &str) -> String {
    format!(
        r#"{{"id":"{id}","name":"{name}","size":1024,"type":"{mime}","createdAt":"2025-03-01T10:00:00Z","url":"https://cdn.example.com/{name}"}}"#
    )
}

fn listing(items: &[String], page: u32, has_more: bool) -> String {
    format!(
        r#"{{"media":[{}],"pagination":{{"page":{page},"limit":2,"hasMore":{has_more},"total":3}}}}"#,
        items.join(",")
    )
}

fn picker(client: &Arc<ApiClient>) -> MediaPicker {
    MediaPicker::new(
        Arc::clone(client) as Arc<dyn MediaRepo>,
        MediaPickerSettings {
            page_size: 2,
            max_upload_bytes: 1024,
        },
    )
}

fn form() -> PostForm {
    let mut form = PostForm::default();
    form.set_title("Field Notes");
    form.excerpt = "From the trail".into();
    form.category = "travel".into();
    form.author = "author-7".into();
    form
}

#[tokio::test]
async fn media_library_insert_flows_into_saved_post() {
    let server = MockServer::start();
    let page_one = server.mock(|when, then| {
        when.method("GET").path("/api/media").query_param("page", "1");
        then.status(200)
            .header("content-type", "application/json")
            .body(listing(
                &[
                    media_item("m1", "peak.png", "image/png"),
                    media_item("m2", "wind.mp3", "audio/mpeg"),
                ],
                1,
                true,
            ));
    });
    let page_two = server.mock(|when, then| {
        when.method("GET").path("/api/media").query_param("page", "2");
        then.status(200)
            .header("content-type", "application/json")
            .body(listing(&[media_item("m3", "lake.jpg", "image/jpeg")], 2, false));
    });
    let create = server.mock(|when, then| {
        when.method("POST")
            .path("/api/create-post")
            .body_includes("https://cdn.example.com/lake.jpg")
            .body_includes("field-notes");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"blog_id":"p-1"}"#);
    });

    let client = client(&server);
    let mut session =
        EditorSession::new(standard_registry(), CommandMenu::default()).expect("session");
    let mut controller = PostFormController::new(
        form(),
        session.subscribe(),
        Arc::clone(&client) as Arc<dyn PostsRepo>,
    );

    let cursor = session.document().blocks()[0].id.clone();
    let request = match session
        .execute_command(MEDIA_LIBRARY_KEY, &cursor)
        .expect("command")
    {
        CommandOutcome::MediaRequested(request) => request,
        other => panic!("expected a media request, got {other:?}"),
    };
    assert_eq!(request.target, MediaTarget::InsertImageAfter(cursor.clone()));

    let mut picker = picker(&client);
    assert_eq!(picker.open(request.allowed.clone()).await, PageOutcome::Applied(2));
    assert_eq!(picker.visible().len(), 1, "audio is filtered out for images");
    assert_eq!(picker.load_more().await.expect("page 2"), PageOutcome::Applied(1));
    assert!(!picker.has_more());
    page_one.assert();
    page_two.assert();

    let url = picker.select("m3").expect("select");
    assert!(!picker.is_open());
    let image = session.complete_media(request.id, &url).expect("complete");

    let inserted = session.block(&image).expect("image block");
    assert_eq!(inserted.kind, kinds::IMAGE);
    assert_eq!(inserted.prop_str("url"), url);
    assert_eq!(session.document().position(&image), Some(1));

    let outcome = controller.save().await.expect("save");
    create.assert();
    assert_eq!(outcome, SaveOutcome::Created { id: "p-1".into() });
    assert_eq!(controller.content(), session.snapshot());

    let html = render_snapshot(session.document().registry(), &controller.content())
        .expect("render");
    assert!(html.contains(r#"src="https://cdn.example.com/lake.jpg""#), "{html}");
}

#[tokio::test]
async fn bullet_icon_from_library_forces_custom_style() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/media");
        then.status(200)
            .header("content-type", "application/json")
            .body(listing(&[media_item("i1", "leaf.svg", "image/svg+xml")], 1, false));
    });

    let client = client(&server);
    let mut session =
        EditorSession::new(standard_registry(), CommandMenu::default()).expect("session");
    let first = session.document().blocks()[0].id.clone();
    let bullet = session
        .insert_block(
            NewBlock::new(kinds::CUSTOM_BULLET)
                .with_prop(BULLET_TYPE_PROP, "star")
                .with_text("Pack water"),
            &first,
            Placement::After,
        )
        .expect("bullet");

    let request = session.request_bullet_icon(&bullet).expect("request");
    let mut picker = picker(&client);
    picker.open(request.allowed.clone()).await;
    let url = picker.select("i1").expect("select");
    session.complete_media(request.id, &url).expect("complete");

    let block = session.block(&bullet).expect("bullet block");
    assert_eq!(block.prop_str(BULLET_TYPE_PROP), "custom");
    assert_eq!(block.prop_str(BULLET_ICON_PROP), "https://cdn.example.com/leaf.svg");

    let next = session.continue_bullet(&bullet).expect("continue");
    let next_block = session.block(&next).expect("continued");
    assert_eq!(next_block.prop_str(BULLET_TYPE_PROP), "custom");
    assert_eq!(next_block.prop_str(BULLET_ICON_PROP), "https://cdn.example.com/leaf.svg");
}

#[tokio::test]
async fn upload_batch_reports_each_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/media");
        then.status(200)
            .header("content-type", "application/json")
            .body(listing(&[media_item("ok-1", "good.png", "image/png")], 1, false));
    });
    server.mock(|when, then| {
        when.method("POST")
            .path("/api/upload")
            .body_includes(r#"filename="good.png""#);
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"publicUrl":"https://cdn.example.com/good.png","id":"ok-1"}"#);
    });
    server.mock(|when, then| {
        when.method("POST")
            .path("/api/upload")
            .body_includes(r#"filename="bad.png""#);
        then.status(500)
            .header("content-type", "application/json")
            .body(r#"{"error":"storage unavailable"}"#);
    });

    let client = client(&server);
    let mut picker = picker(&client);
    picker.open(MimeAllowList::images()).await;

    let report = picker
        .upload_files(vec![
            UploadFile::new("good.png", "image/png", "a".into()),
            UploadFile::new("bad.png", "image/png", "b".into()),
            UploadFile::new("huge.png", "image/png", vec![0u8; 4096].into()),
        ])
        .await
        .expect("batch");

    assert_eq!(report.uploaded.len(), 1);
    let failed: Vec<&str> = report
        .failures
        .iter()
        .map(|failure| failure.file_name.as_str())
        .collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.contains(&"bad.png"));
    assert!(failed.contains(&"huge.png"));
    assert!(
        report
            .failures
            .iter()
            .any(|failure| failure.message.contains("storage unavailable"))
    );
    assert_eq!(picker.upload_errors().len(), 2);
    assert!(picker.visible().iter().any(|asset| asset.id == "ok-1"));
}

#[tokio::test]
async fn failed_update_keeps_form_and_document() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/update-post");
        then.status(502).body("bad gateway");
    });

    let client = client(&server);
    let mut session =
        EditorSession::new(standard_registry(), CommandMenu::default()).expect("session");
    let mut form = form();
    form.id = Some("17".into());
    let mut controller = PostFormController::new(
        form,
        session.subscribe(),
        Arc::clone(&client) as Arc<dyn PostsRepo>,
    );

    let first = session.document().blocks()[0].id.clone();
    session
        .insert_block(
            NewBlock::new(kinds::HEADING).with_text("Day one"),
            &first,
            Placement::After,
        )
        .expect("insert");

    let before = controller.form().clone();
    assert!(controller.save().await.is_err());
    assert_eq!(controller.form(), &before);
    assert_eq!(controller.content().len(), 2);
    assert_eq!(
        controller.last_error(),
        Some("Failed to save post. Please try again.")
    );
}
