//! Prompt templates.

use minijinja::{context, Environment};

const NEWS_BULLETS: &str = include_str!("templates/news_bullets.j2");

pub struct Prompts {
    env: Environment<'static>,
}

impl Prompts {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("news_bullets", NEWS_BULLETS)?;
        Ok(Self { env })
    }

    /// Prompt asking the chat model for `{"bullets": [...]}` about one company.
    pub fn news_bullets(&self, company_name: &str, raw_info: &str) -> Result<String, minijinja::Error> {
        self.env
            .get_template("news_bullets")?
            .render(context! { company_name, raw_info })
    }
}
