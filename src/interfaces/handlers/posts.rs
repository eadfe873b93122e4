use std::collections::HashMap;

use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use tracing::{instrument, warn};

use crate::{
    entities::{
        image::ImageUpload,
        pagination::PageRequest,
        post::{NewPostRequest, PostUploadForm},
    },
    errors::AppError,
    AppState,
};

#[instrument(skip(state, query))]
pub async fn get_posts(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    let page = PageRequest::from_query(
        &query,
        state.pagination.default_page_size,
        state.pagination.max_page_size,
    );

    let posts = state.post_handler.list_posts(page).await?;

    Ok(HttpResponse::Ok().json(posts))
}

#[instrument(skip(state, form))]
pub async fn create_post(
    state: web::Data<AppState>,
    form: Result<MultipartForm<PostUploadForm>, actix_web::Error>,
) -> Result<impl Responder, AppError> {
    let form = form.inspect_err(|e| warn!("Rejected upload form: {}", e))?;
    let request = read_upload_form(form.into_inner()).await?;

    let response = state.post_handler.create_post(request).await?;

    Ok(HttpResponse::Created().json(response))
}

/// Lifts the multipart form into a transport-free request, reading each
/// spooled file part into memory in payload order.
async fn read_upload_form(form: PostUploadForm) -> Result<NewPostRequest, AppError> {
    let mut files = Vec::with_capacity(form.files.len());

    for upload in form.files {
        let data = tokio::fs::read(upload.file.path()).await?;
        files.push(ImageUpload::new(upload.file_name, data));
    }

    Ok(NewPostRequest {
        content: form.content.map(|t| t.into_inner()),
        nombre: form.nombre.map(|t| t.into_inner()),
        titulo: form.titulo.map(|t| t.into_inner()),
        files,
    })
}
