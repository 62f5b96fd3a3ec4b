use askama::Template;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::home::Html;
use crate::routes::posts::{may_edit, PostView};
use crate::state::AppState;
use crate::uploads;

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub username: String,
    pub name: String,
    pub avatar_url: String,
    pub posts: Vec<PostView>,
    pub feed: Vec<PostView>,
}

#[derive(Template)]
#[template(path = "pages/upload.html")]
pub struct UploadTemplate;

/// Routes that require a session; the caller layers the gate on top.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/upload", post(upload))
}

/// GET /profile: the caller's details, their posts, and everyone else's
async fn profile(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let account = state.users.find_by_id(&user.id)?.ok_or(AppError::NotFound)?;

    let posts = state
        .posts
        .list_by_owner(&account.id)?
        .into_iter()
        .map(|post| PostView::new(post, account.username.clone(), &account.id, true))
        .collect();

    let feed = state
        .posts
        .list_others(&account.id)?
        .into_iter()
        .map(|entry| {
            let can_edit = may_edit(&state, &entry.post, &account.id);
            PostView::new(entry.post, entry.author, &account.id, can_edit)
        })
        .collect();

    Ok(Html(ProfileTemplate {
        avatar_url: account.avatar_url(),
        username: account.username,
        name: account.name,
        posts,
        feed,
    })
    .into_response())
}

/// GET /profile/upload
pub async fn upload_page() -> Html<UploadTemplate> {
    Html(UploadTemplate)
}

/// POST /upload: store the `image` field and make it the profile picture
async fn upload(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        if uploads::image_extension(&original_name).is_none() {
            return Err(AppError::BadRequest("Only image files can be uploaded".into()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)))?;

        let filename = uploads::store(&state.config.uploads_path(), &original_name, &data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

        state.users.set_profile_pic(&user.id, &filename)?;
        tracing::info!("User {} uploaded profile picture {}", user.id, filename);

        return Ok(Redirect::to("/profile").into_response());
    }

    Err(AppError::BadRequest("Missing image field".into()))
}
