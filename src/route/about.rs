use axum::{response::Html, routing::get, Router};

use crate::{extract::Session, template, AppState, Error};

pub fn routes() -> Router<AppState> {
	Router::new()
		.route("/author/", get(author))
		.route("/tech/", get(tech))
}

pub async fn author(session: Option<Session>) -> Result<Html<String>, Error> {
	template::render("about/author.html", template::context(session.as_ref()))
}

pub async fn tech(session: Option<Session>) -> Result<Html<String>, Error> {
	template::render("about/tech.html", template::context(session.as_ref()))
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_static_pages(pool: Database) {
		let app = app(pool);

		for (url, template) in [
			("/about/author/", "about/author.html"),
			("/about/tech/", "about/tech.html"),
		] {
			let response = app.server.get(url).await;

			assert_eq!(response.status_code(), StatusCode::OK);
			assert_template(&response, template);
		}
	}
}
