use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;

use crate::auth::ACCOUNT_ID_HEADER;

/// Sends `req` to an app set up by `configure`, and returns the status and body of the response.
///
/// Errors raised by middleware are not turned into responses by the test service, so they come back as `Err`.
pub async fn send_request<F>(req: TestRequest, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn get_request<F>(path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), configure).await
}

pub fn json_post(path: &str, account_header: Option<&str>, body: serde_json::Value) -> TestRequest {
    let mut req = TestRequest::post().uri(path).set_json(body);
    if let Some(id) = account_header {
        req = req.insert_header((ACCOUNT_ID_HEADER, id.to_string()));
    }
    req
}
