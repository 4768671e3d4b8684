use axum::{
	middleware,
	routing::{get, post},
	Router,
};

use crate::{cache, AppState};

pub mod model;
pub mod route;

pub fn routes(state: &AppState) -> Router<AppState> {
	use route::*;

	Router::new()
		.route(
			"/",
			get(index).layer(middleware::from_fn_with_state(
				state.feed_cache.clone(),
				cache::cache_page,
			)),
		)
		.route("/group/:slug/", get(group_list))
		.route("/profile/:username/", get(profile))
		.route("/posts/:id/", get(post_detail))
		.route("/create/", get(create_post_form).post(create_post))
		.route("/posts/:id/edit/", get(edit_post_form).post(edit_post))
		.route("/posts/:id/delete/", post(delete_post))
		.route("/posts/:id/comment/", get(comment_form).post(add_comment))
}

#[cfg(test)]
mod test {
	use axum_test::multipart::{MultipartForm, Part};

	use crate::test::*;

	fn post_form(text: &str, group: Option<i64>) -> MultipartForm {
		let form = MultipartForm::new().add_text("text", text.to_owned());

		match group {
			Some(group) => form.add_text("group", group.to_string()),
			None => form,
		}
	}

	#[sqlx::test]
	async fn test_pages_use_correct_templates(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let group = create_group(&app.state.database, "Test group", "test-slug").await;
		let post_id = create_post(&app.state.database, &user, "Test post", Some(&group)).await;
		let cookie = login(&app.state.database, &user).await;

		let pages = [
			("/".to_owned(), "posts/index.html"),
			("/group/test-slug/".to_owned(), "posts/group_list.html"),
			("/profile/auth/".to_owned(), "posts/profile.html"),
			(format!("/posts/{post_id}/"), "posts/post_detail.html"),
			("/create/".to_owned(), "posts/create_post.html"),
			(format!("/posts/{post_id}/edit/"), "posts/create_post.html"),
			("/follow/".to_owned(), "posts/follow.html"),
		];

		for (url, template) in pages {
			let response = app.server.get(&url).add_cookie(cookie.clone()).await;

			assert_eq!(response.status_code(), StatusCode::OK, "{url}");
			assert_template(&response, template);
		}
	}

	#[sqlx::test]
	async fn test_public_pages_are_open_to_guests(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		create_group(&app.state.database, "Test group", "test-slug").await;
		let post_id = create_post(&app.state.database, &user, "Test post", None).await;

		for url in [
			"/".to_owned(),
			"/group/test-slug/".to_owned(),
			"/profile/auth/".to_owned(),
			format!("/posts/{post_id}/"),
			"/about/author/".to_owned(),
			"/about/tech/".to_owned(),
		] {
			let response = app.server.get(&url).await;

			assert_eq!(response.status_code(), StatusCode::OK, "{url}");
		}
	}

	#[sqlx::test]
	async fn test_unknown_pages_are_not_found(pool: Database) {
		let app = app(pool);

		for url in [
			"/unexisting_page/",
			"/group/missing/",
			"/profile/nobody/",
			"/posts/9999/",
			"/posts/abc/",
		] {
			let response = app.server.get(url).await;

			assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{url}");
			assert_template(&response, "core/404.html");
		}
	}

	#[sqlx::test]
	async fn test_guest_is_sent_to_login(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let post_id = create_post(&app.state.database, &user, "Test post", None).await;

		let response = app.server.get("/create/").await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert_eq!(response.header("location"), "/auth/login/?next=%2Fcreate%2F");

		let response = app.server.get(&format!("/posts/{post_id}/edit/")).await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert_eq!(
			response.header("location"),
			format!("/auth/login/?next=%2Fposts%2F{post_id}%2Fedit%2F")
		);

		let response = app
			.server
			.post("/create/")
			.multipart(post_form("Guest post", None))
			.await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert_eq!(post_count(&app.state.database).await, 1);
	}

	#[sqlx::test]
	async fn test_create_post(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let group = create_group(&app.state.database, "Test group", "test-slug").await;
		let cookie = login(&app.state.database, &user).await;

		let form = post_form("Test text", Some(group.id)).add_part(
			"image",
			Part::bytes(SMALL_GIF.to_vec())
				.file_name("small.gif")
				.mime_type("image/gif"),
		);

		let response = app
			.server
			.post("/create/")
			.add_cookie(cookie)
			.multipart(form)
			.await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert_eq!(response.header("location"), "/profile/auth/");
		assert_eq!(post_count(&app.state.database).await, 1);

		let (text, group_id, image): (String, Option<i64>, Option<String>) =
			sqlx::query_as("SELECT text, group_id, image FROM post")
				.fetch_one(&app.state.database)
				.await
				.unwrap();

		assert_eq!(text, "Test text");
		assert_eq!(group_id, Some(group.id));

		let image = image.unwrap();

		assert!(image.starts_with("posts/"));
		assert!(app.state.media.path().join(&image).exists());

		let response = app.server.get(&format!("/media/{image}")).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.as_bytes().as_ref(), SMALL_GIF);
	}

	#[sqlx::test]
	async fn test_create_post_redisplays_invalid_form(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let cookie = login(&app.state.database, &user).await;

		let response = app
			.server
			.post("/create/")
			.add_cookie(cookie.clone())
			.multipart(post_form("   ", None))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_template(&response, "posts/create_post.html");
		assert!(response.text().contains("This field is required."));

		let form = post_form("Test text", None).add_part(
			"image",
			Part::bytes(b"not an image".to_vec())
				.file_name("notes.txt")
				.mime_type("text/plain"),
		);

		let response = app
			.server
			.post("/create/")
			.add_cookie(cookie)
			.multipart(form)
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(response.text().contains("Upload a valid image."));
		assert_eq!(post_count(&app.state.database).await, 0);
	}

	#[sqlx::test]
	async fn test_edit_post(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let group = create_group(&app.state.database, "Test group", "test-slug").await;
		let post_id = create_post(&app.state.database, &user, "Test post", Some(&group)).await;
		let cookie = login(&app.state.database, &user).await;

		let response = app
			.server
			.get(&format!("/posts/{post_id}/edit/"))
			.add_cookie(cookie.clone())
			.await;

		assert!(response.text().contains("Test post"));

		let response = app
			.server
			.post(&format!("/posts/{post_id}/edit/"))
			.add_cookie(cookie)
			.multipart(post_form("Changed text", None))
			.await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert_eq!(response.header("location"), format!("/posts/{post_id}/"));

		let (text, group_id): (String, Option<i64>) =
			sqlx::query_as("SELECT text, group_id FROM post WHERE id = $1")
				.bind(post_id)
				.fetch_one(&app.state.database)
				.await
				.unwrap();

		assert_eq!(text, "Changed text");
		assert_eq!(group_id, None);
		assert_eq!(post_count(&app.state.database).await, 1);
	}

	#[sqlx::test]
	async fn test_only_author_edits_post(pool: Database) {
		let app = app(pool);
		let author = create_user(&app.state.database, "auth").await;
		let other = create_user(&app.state.database, "not-auth").await;
		let post_id = create_post(&app.state.database, &author, "Test post", None).await;
		let cookie = login(&app.state.database, &other).await;

		let response = app
			.server
			.get(&format!("/posts/{post_id}/edit/"))
			.add_cookie(cookie.clone())
			.await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert_eq!(response.header("location"), format!("/posts/{post_id}/"));

		let response = app
			.server
			.post(&format!("/posts/{post_id}/edit/"))
			.add_cookie(cookie.clone())
			.multipart(post_form("Hijacked", None))
			.await;

		assert_eq!(response.status_code(), StatusCode::FOUND);

		let response = app
			.server
			.post(&format!("/posts/{post_id}/delete/"))
			.add_cookie(cookie)
			.await;

		assert_eq!(response.status_code(), StatusCode::FOUND);

		let text: String = sqlx::query_scalar("SELECT text FROM post WHERE id = $1")
			.bind(post_id)
			.fetch_one(&app.state.database)
			.await
			.unwrap();

		assert_eq!(text, "Test post");
	}

	#[sqlx::test]
	async fn test_delete_post(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let post_id = create_post(&app.state.database, &user, "Test post", None).await;
		let cookie = login(&app.state.database, &user).await;

		let response = app
			.server
			.post(&format!("/posts/{post_id}/delete/"))
			.add_cookie(cookie)
			.await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert_eq!(response.header("location"), "/profile/auth/");
		assert_eq!(post_count(&app.state.database).await, 0);
	}

	#[sqlx::test]
	async fn test_feeds_are_paginated(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let group = create_group(&app.state.database, "Test group", "test-slug").await;

		for i in 0..12 {
			create_post(&app.state.database, &user, &format!("Post {i}"), Some(&group)).await;
		}

		for url in ["/", "/group/test-slug/", "/profile/auth/"] {
			let response = app.server.get(url).await;

			assert_eq!(count_posts(&response), 10, "{url}");
			assert!(response.text().contains("Post 11"));

			let response = app.server.get(url).add_query_param("page", "2").await;

			assert_eq!(count_posts(&response), 2, "{url}");
		}
	}

	#[sqlx::test]
	async fn test_group_page_excludes_other_groups(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let first = create_group(&app.state.database, "Test group", "test-slug").await;
		create_group(&app.state.database, "Other group", "other-slug").await;
		let post_id = create_post(&app.state.database, &user, "Test post", Some(&first)).await;

		let marker = format!(r#"data-post="{post_id}""#);

		let response = app.server.get("/group/test-slug/").await;

		assert!(response.text().contains(&marker));

		let response = app.server.get("/group/other-slug/").await;

		assert!(!response.text().contains(&marker));
	}

	#[sqlx::test]
	async fn test_index_is_cached(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let post_id = create_post(&app.state.database, &user, "Cached post", None).await;

		let before = app.server.get("/").await.text();

		sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(post_id)
			.execute(&app.state.database)
			.await
			.unwrap();

		let cached = app.server.get("/").await.text();

		assert_eq!(before, cached);
		assert!(cached.contains("Cached post"));

		app.state.feed_cache.clear();

		let fresh = app.server.get("/").await.text();

		assert_ne!(before, fresh);
		assert!(!fresh.contains("Cached post"));
	}

	#[sqlx::test]
	async fn test_comments(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let post_id = create_post(&app.state.database, &user, "Test post", None).await;
		let url = format!("/posts/{post_id}/comment/");

		let response = app.server.post(&url).form(&[("text", "Guest comment")]).await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert!(response.header("location").to_str().unwrap().starts_with("/auth/login/"));

		let cookie = login(&app.state.database, &user).await;

		let response = app
			.server
			.post(&url)
			.add_cookie(cookie.clone())
			.form(&[("text", "Test comment")])
			.await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert_eq!(response.header("location"), format!("/posts/{post_id}/"));

		app.server
			.post(&url)
			.add_cookie(cookie)
			.form(&[("text", "   ")])
			.await;

		let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comment")
			.fetch_one(&app.state.database)
			.await
			.unwrap();

		assert_eq!(comments, 1);

		let response = app.server.get(&format!("/posts/{post_id}/")).await;

		assert!(response.text().contains("Test comment"));
	}

	#[sqlx::test]
	async fn test_guest_cannot_edit_post(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let post_id = create_post(&app.state.database, &user, "Test post", None).await;

		let response = app
			.server
			.post(&format!("/posts/{post_id}/edit/"))
			.multipart(post_form("Guest edit", None))
			.await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert!(response
			.header("location")
			.to_str()
			.unwrap()
			.starts_with("/auth/login/?next="));

		let text: String = sqlx::query_scalar("SELECT text FROM post WHERE id = $1")
			.bind(post_id)
			.fetch_one(&app.state.database)
			.await
			.unwrap();

		assert_eq!(text, "Test post");
	}

	#[sqlx::test]
	async fn test_index_cache_holds_new_posts_back(pool: Database) {
		let app = app(pool);
		let user = create_user(&app.state.database, "auth").await;
		let cookie = login(&app.state.database, &user).await;

		create_post(&app.state.database, &user, "Old post", None).await;

		let before = app.server.get("/").add_cookie(cookie.clone()).await.text();

		assert!(before.contains(r#"href="/profile/auth/""#));

		let response = app
			.server
			.post("/create/")
			.add_cookie(cookie.clone())
			.multipart(post_form("Fresh post", None))
			.await;

		assert_eq!(response.status_code(), StatusCode::FOUND);
		assert_eq!(post_count(&app.state.database).await, 2);

		let cached = app.server.get("/").add_cookie(cookie.clone()).await.text();

		assert_eq!(before, cached);
		assert!(!cached.contains("Fresh post"));

		let guest = app.server.get("/").await.text();

		assert!(guest.contains("Fresh post"));
		assert!(!guest.contains(r#"href="/profile/auth/""#));

		app.state.feed_cache.clear();

		let fresh = app.server.get("/").add_cookie(cookie).await.text();

		assert_ne!(before, fresh);
		assert!(fresh.contains("Fresh post"));
	}

	fn count_posts(response: &axum_test::TestResponse) -> usize {
		response.text().matches("data-post=").count()
	}
}
