use axum::response::Html;
use once_cell::sync::Lazy;
use tera::{Context, Tera};

use crate::{extract::Session, Error};

macro_rules! templates {
	($($name:literal),* $(,)?) => {
		[$(($name, include_str!(concat!("../templates/", $name)))),*]
	};
}

/// Every page template, compiled into the binary.
pub static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
	let mut tera = Tera::default();

	tera.add_raw_templates(templates![
		"base.html",
		"includes/form_errors.html",
		"includes/paginator.html",
		"includes/post.html",
		"posts/index.html",
		"posts/group_list.html",
		"posts/profile.html",
		"posts/post_detail.html",
		"posts/create_post.html",
		"posts/follow.html",
		"users/login.html",
		"users/signup.html",
		"users/logged_out.html",
		"about/author.html",
		"about/tech.html",
		"core/404.html",
		"core/500.html",
	])
	.expect("templates must compile");

	tera.autoescape_on(vec![".html"]);
	tera
});

/// Base context shared by every page: the signed-in user, if any.
pub fn context(session: Option<&Session>) -> Context {
	let mut context = Context::new();

	context.insert("user", &session.map(|session| &session.user.username));
	context
}

/// Renders `name`, exposing the template name to the layout.
pub fn render(name: &'static str, mut context: Context) -> Result<Html<String>, Error> {
	context.insert("template", name);

	Ok(Html(TEMPLATES.render(name, &context)?))
}
