use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::db::models::Post;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PostForm {
    pub content: String,
}

/// What the profile page needs to draw one post.
pub struct PostView {
    pub id: String,
    pub author: String,
    pub content: String,
    pub like_count: usize,
    pub liked: bool,
    pub can_edit: bool,
}

impl PostView {
    pub fn new(post: Post, author: String, viewer_id: &str, can_edit: bool) -> Self {
        Self {
            like_count: post.likes.len(),
            liked: post.is_liked_by(viewer_id),
            id: post.id,
            author,
            content: post.content,
            can_edit,
        }
    }
}

#[derive(Template)]
#[template(path = "pages/edit.html")]
pub struct EditTemplate {
    pub post_id: String,
    pub content: String,
}

/// Routes that require a session; the caller layers the gate on top.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/post", post(create_post))
        .route("/like/{id}", get(toggle_like))
        .route("/edit/{id}", get(edit_page))
        .route("/update/{id}", post(update_post))
}

/// Whether `user_id` may edit `post` under the configured policy.
pub fn may_edit(state: &AppState, post: &Post, user_id: &str) -> bool {
    !state.config.posts.edit_requires_ownership || post.is_owned_by(user_id)
}

fn load_editable(state: &AppState, post_id: &str, user: &CurrentUser) -> AppResult<Post> {
    let post = state.posts.get(post_id)?.ok_or(AppError::NotFound)?;
    if !may_edit(state, &post, &user.id) {
        tracing::warn!("User {} may not edit post {}", user.id, post_id);
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

/// POST /post
async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let post = state.posts.create(&user.id, &form.content)?;
    tracing::info!("User {} created post {}", user.id, post.id);
    Ok(Redirect::to("/profile").into_response())
}

/// GET /like/{id}: like if not yet liked, otherwise unlike
async fn toggle_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let post = state.posts.toggle_like(&post_id, &user.id)?;
    tracing::debug!(
        "User {} toggled like on {} (now {} likes)",
        user.id,
        post.id,
        post.likes.len()
    );
    Ok(Redirect::to("/profile").into_response())
}

/// GET /edit/{id}
async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let post = load_editable(&state, &post_id, &user)?;
    Ok(Html(EditTemplate {
        post_id: post.id,
        content: post.content,
    })
    .into_response())
}

/// POST /update/{id}
async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    load_editable(&state, &post_id, &user)?;
    state.posts.update_content(&post_id, &form.content)?;
    Ok(Redirect::to("/profile").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::tests::test_pool;

    fn post_by(owner: &str, likes: &[&str]) -> Post {
        Post {
            id: "p1".into(),
            user_id: owner.into(),
            content: "hello".into(),
            likes: likes.iter().map(|s| s.to_string()).collect(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn state(edit_requires_ownership: bool) -> AppState {
        let mut config = Config::default();
        config.auth.token_secret = Some("posts-secret".into());
        config.posts.edit_requires_ownership = edit_requires_ownership;
        AppState::new(test_pool(), config).unwrap()
    }

    #[test]
    fn anyone_may_edit_by_default() {
        let state = state(false);
        assert!(may_edit(&state, &post_by("alice", &[]), "bob"));
    }

    #[test]
    fn ownership_policy_restricts_to_author() {
        let state = state(true);
        let post = post_by("alice", &[]);
        assert!(may_edit(&state, &post, "alice"));
        assert!(!may_edit(&state, &post, "bob"));
    }

    #[test]
    fn view_reflects_viewer_like_state() {
        let view = PostView::new(post_by("alice", &["bob", "carol"]), "alice".into(), "bob", false);
        assert_eq!(view.like_count, 2);
        assert!(view.liked);
        assert!(!view.can_edit);

        let view = PostView::new(post_by("alice", &["carol"]), "alice".into(), "bob", true);
        assert!(!view.liked);
        assert!(view.can_edit);
    }
}
