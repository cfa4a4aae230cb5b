//! HTTP services of the admin server.
//!
//! Every route lives under `/api/tables`:
//! - `tables`: table listing, table detail and row create/update/delete.
//! - `data_sources::csv`: CSV export, import and preview.

pub mod data_sources;
pub mod tables;

use crate::error::Result;
use actix_web::web::{self, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/tables";

/// Configures and returns the Actix scope holding every table route.
///
/// Both route groups share the `{table}` path segment, so they are registered
/// on one scope rather than two overlapping ones.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .configure(data_sources::csv::configure)
        .configure(tables::configure)
}

/// Runs blocking SQLite work on the Actix blocking pool.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::storage::test_support::temp_store;
    use crate::table_locks::state::TableLocks;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use common::model::report::{ImportOutcome, ImportReport, RowOutcome};
    use common::model::table::{Table, TableContents};

    const BOUNDARY: &str = "----admin-test-boundary";

    fn multipart(filename: &str, content: &str) -> (String, String) {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
            b = BOUNDARY,
            f = filename,
            c = content
        );
        (format!("multipart/form-data; boundary={}", BOUNDARY), body)
    }

    macro_rules! admin_app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($store.clone()))
                    .app_data(web::Data::new(TableLocks::new()))
                    .app_data(web::Data::new(AppConfig::default()))
                    .service(configure_routes()),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn lists_tables() {
        let (_dir, store) = temp_store();
        let app = admin_app!(store);

        let req = test::TestRequest::get().uri("/api/tables").to_request();
        let tables: Vec<Table> = test::call_and_read_body_json(&app, req).await;
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"modes"));
        assert!(names.contains(&"hafizs_users"));
        assert!(!names.contains(&"import_audit"));
    }

    #[actix_web::test]
    async fn unknown_table_is_not_found() {
        let (_dir, store) = temp_store();
        let app = admin_app!(store);

        let req = test::TestRequest::get().uri("/api/tables/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn export_is_a_csv_attachment() {
        let (_dir, store) = temp_store();
        let app = admin_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/tables/modes/export")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("modes.csv"));
        let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/csv"));

        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"id,name,description\n1,1. Full Cycle,"));
    }

    #[actix_web::test]
    async fn import_commits_and_detail_shows_it() {
        let (_dir, store) = temp_store();
        let app = admin_app!(store);

        let (content_type, body) = multipart(
            "mode_import_for_test.csv",
            "id,name,description\n1,1. Full Cycle,Imported file - Done\n",
        );
        let req = test::TestRequest::post()
            .uri("/api/tables/modes/import")
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        let report: ImportReport = test::call_and_read_body_json(&app, req).await;
        assert!(report.committed);
        assert_eq!(report.rows[0].outcome, RowOutcome::Done);

        let req = test::TestRequest::get().uri("/api/tables/modes").to_request();
        let contents: TableContents = test::call_and_read_body_json(&app, req).await;
        assert_eq!(contents.rows[0].to_fields()[2], "Imported file - Done");
    }

    #[actix_web::test]
    async fn import_with_wrong_columns_is_unprocessable() {
        let (_dir, store) = temp_store();
        let app = admin_app!(store);

        let (content_type, body) = multipart("incorrect_mode_for_test.csv", "id,title\n1,x\n");
        let req = test::TestRequest::post()
            .uri("/api/tables/modes/import")
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let report: ImportReport = test::read_body_json(resp).await;
        assert!(matches!(report.outcome, ImportOutcome::SchemaMismatch { .. }));
        assert!(report.message.contains("check the columns"));
    }

    #[actix_web::test]
    async fn import_into_unknown_table_takes_no_lock() {
        let (_dir, store) = temp_store();
        let locks = TableLocks::new();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(store.clone()))
                .app_data(web::Data::new(locks.clone()))
                .app_data(web::Data::new(AppConfig::default()))
                .service(configure_routes()),
        )
        .await;

        for i in 0..20 {
            let (content_type, body) = multipart("modes.csv", "id,name,description\n");
            let req = test::TestRequest::post()
                .uri(&format!("/api/tables/no_such_table_{}/import", i))
                .insert_header((header::CONTENT_TYPE, content_type))
                .set_payload(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        }
        assert_eq!(locks.tracked_tables().await, 0);

        let (content_type, body) = multipart("modes.csv", "id,name,description\n");
        let req = test::TestRequest::post()
            .uri("/api/tables/modes/import")
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(locks.tracked_tables().await, 1);
    }

    #[actix_web::test]
    async fn preview_does_not_commit() {
        let (_dir, store) = temp_store();
        let app = admin_app!(store);

        let (content_type, body) = multipart(
            "mode_import_for_test.csv",
            "id,name,description\n1,1. Full Cycle,Imported file - Done\n",
        );
        let req = test::TestRequest::post()
            .uri("/api/tables/modes/preview")
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        let report: ImportReport = test::call_and_read_body_json(&app, req).await;
        assert!(!report.committed);
        assert_eq!(report.filename, "mode_import_for_test.csv");
        assert_eq!(report.rows[0].values[2], "Imported file - Done");

        let req = test::TestRequest::get().uri("/api/tables/modes").to_request();
        let contents: TableContents = test::call_and_read_body_json(&app, req).await;
        assert_eq!(contents.rows[0].to_fields()[2], "");
    }

    #[actix_web::test]
    async fn non_csv_upload_is_rejected() {
        let (_dir, store) = temp_store();
        let app = admin_app!(store);

        let (content_type, body) = multipart("modes.txt", "id,name,description\n");
        let req = test::TestRequest::post()
            .uri("/api/tables/modes/import")
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn row_routes() {
        let (_dir, store) = temp_store();
        let app = admin_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/tables/modes/rows")
            .set_json(serde_json::json!({ "name": "Test - New Mode" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::put()
            .uri("/api/tables/modes/rows/1")
            .set_json(serde_json::json!({
                "name": "1. Full Cycle",
                "description": "Added test description for update SEQ"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri("/api/tables/modes/rows/6")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri("/api/tables/modes").to_request();
        let contents: TableContents = test::call_and_read_body_json(&app, req).await;
        assert_eq!(contents.rows.len(), 5);
        assert_eq!(
            contents.rows[0].to_fields()[2],
            "Added test description for update SEQ"
        );
    }
}
