use serde::{Deserialize, Serialize};

/// Server location for the note API.
///
/// The app is normally served by the same daemon that exposes the note
/// endpoints, so the default is same-origin (empty prefix). A deployment can
/// point the client elsewhere through `window.ENV.API_URL`; the lowercase
/// `api_url` key is accepted for compatibility.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url) = api_url.as_string() {
                            return Self { api_url: url };
                        }
                    }

                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"api_url".into()) {
                        if let Some(url) = api_url.as_string() {
                            return Self { api_url: url };
                        }
                    }
                }
            }
        }

        Self {
            api_url: String::new(),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}
