use crate::api::{ApiClient, ApiError};
use crate::model::{Breadcrumb, Note, Notebook};
use crate::path;
use crate::router::{NavigationEngine, ViewMode};
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

pub(crate) type Engine = NavigationEngine<ApiClient>;

/// The engine is built on `Rc` and is not `Send`, but `provide_context` and
/// the view tree's closures demand `Send + Sync`. A `LocalStorage` arena
/// handle is both, so the engine lives in the thread-local arena and only
/// the handle crosses those boundaries.
#[derive(Clone, Copy)]
pub(crate) struct EngineContext(pub StoredValue<Engine, LocalStorage>);

#[derive(Clone, Copy)]
pub(crate) struct ApiContext(pub StoredValue<ApiClient, LocalStorage>);

/// Inline note editor state. Global so the Ctrl-E/S/X keybindings can reach
/// it from the window keydown listener.
#[derive(Clone, Copy)]
pub(crate) struct EditorState {
    pub editing: RwSignal<bool>,
    pub draft: RwSignal<String>,
    pub saving: RwSignal<bool>,
}

/// Route path for the current browser location (no leading slash; empty
/// string is the root notebook).
fn current_route() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .map(|p| p.trim_start_matches('/').to_string())
        .unwrap_or_default()
}

/// Decide whether an absolute href is ours to route. Only same-origin links
/// to notebooks (trailing `/`, or the site root) and notes (document
/// suffix) are handled; everything else falls through to the browser.
pub(crate) fn route_target(href: &str, origin: &str) -> Option<String> {
    let rest = href.strip_prefix(origin)?;
    let path = rest.strip_prefix('/').unwrap_or(rest);

    if path.is_empty() || path.ends_with('/') || path.ends_with(path::NOTE_EXT) {
        Some(path.to_string())
    } else {
        None
    }
}

fn push_route(route: &str) {
    if let Some(win) = web_sys::window() {
        if let Ok(history) = win.history() {
            let _ = history.push_state_with_url(
                &wasm_bindgen::JsValue::NULL,
                "",
                Some(&format!("/{route}")),
            );
        }
    }
}

fn alert(message: &str) {
    if let Some(win) = web_sys::window() {
        let _ = win.alert_with_message(message);
    }
}

/// Delegated click handling for relative links, including links inside
/// rendered note HTML (which never get per-element handlers). Links with a
/// `data-bypass` attribute or opening a new tab are left alone.
fn on_document_click(engine: &Engine, ev: web_sys::MouseEvent) {
    let Some(target) = ev.target() else {
        return;
    };
    let Some(el) = target
        .dyn_ref::<web_sys::Element>()
        .and_then(|el| el.closest("a").ok().flatten())
    else {
        return;
    };
    let Some(anchor) = el.dyn_ref::<web_sys::HtmlAnchorElement>() else {
        return;
    };

    if anchor.has_attribute("data-bypass") || anchor.target() == "_blank" {
        return;
    }

    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default();
    let Some(route) = route_target(&anchor.href(), &origin) else {
        return;
    };

    ev.prevent_default();
    push_route(&route);
    engine.navigate(&route);
}

fn begin_edit(engine: &Engine, editor: EditorState) {
    let note = engine.model.note.get();
    if note.path.is_empty() {
        return;
    }
    editor.draft.set(note.raw);
    editor.editing.set(true);
}

fn cancel_edit(editor: EditorState) {
    editor.editing.set(false);
}

fn save_edit(api: ApiClient, engine: Engine, editor: EditorState) {
    if !editor.editing.get_untracked() || editor.saving.get_untracked() {
        return;
    }

    let path = engine.model.note.get().path;
    if path.is_empty() {
        return;
    }
    let text = editor.draft.get_untracked().trim().to_string();

    editor.saving.set(true);
    spawn_local(async move {
        match api.save_note(&path, &text).await {
            Ok(data) => {
                engine.commit_saved_note(data);
                editor.editing.set(false);
            }
            Err(e) => alert(&format!("Error: {e}")),
        }
        editor.saving.set(false);
    });
}

#[component]
pub fn App() -> impl IntoView {
    let api = ApiClient::from_env();
    let engine = Engine::new(api.clone());

    provide_context(EngineContext(StoredValue::new_local(engine.clone())));
    provide_context(ApiContext(StoredValue::new_local(api.clone())));

    let editor = EditorState {
        editing: RwSignal::new(false),
        draft: RwSignal::new(String::new()),
        saving: RwSignal::new(false),
    };
    provide_context(editor);

    // Bridge the model's slots into signals. Views only ever subscribe and
    // read; all writes go through the engine.
    let note = RwSignal::new(engine.model.note.get());
    let notebook = RwSignal::new(engine.model.notebook.get());
    let breadcrumbs = RwSignal::new(engine.breadcrumbs.get());
    let mode = RwSignal::new(engine.mode.get());

    let _ = engine.model.note.subscribe(move |n: &Note| note.set(n.clone()));
    let _ = engine
        .model
        .notebook
        .subscribe(move |nb: &Notebook| notebook.set(nb.clone()));
    let _ = engine
        .breadcrumbs
        .subscribe(move |b: &Vec<Breadcrumb>| breadcrumbs.set(b.clone()));
    let _ = engine.mode.subscribe(move |m: &ViewMode| mode.set(*m));

    // Fetch failures block with status and body; there is no toast layer.
    let _ = engine.last_error.subscribe(|err: &Option<ApiError>| {
        if let Some(err) = err {
            alert(&format!("Error: {err}"));
        }
    });

    let engine_pop = engine.clone();
    let pop_handle = window_event_listener(ev::popstate, move |_ev: web_sys::PopStateEvent| {
        engine_pop.navigate(&current_route());
    });

    let engine_click = engine.clone();
    let click_handle = window_event_listener(ev::click, move |ev: web_sys::MouseEvent| {
        on_document_click(&engine_click, ev);
    });

    let engine_keys = engine.clone();
    let api_keys = api.clone();
    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if !ev.ctrl_key() {
            return;
        }
        match ev.key().as_str() {
            "e" => {
                ev.prevent_default();
                begin_edit(&engine_keys, editor);
            }
            "s" => {
                ev.prevent_default();
                save_edit(api_keys.clone(), engine_keys.clone(), editor);
            }
            "x" => {
                ev.prevent_default();
                cancel_edit(editor);
            }
            _ => {}
        }
    });

    // Keep the global listeners alive for the app's lifetime.
    let _handles = StoredValue::new(Some((pop_handle, click_handle, key_handle)));

    // First paint resolves whatever path the browser landed on.
    engine.navigate(&current_route());

    view! {
        <div class="app">
            <NotebookPane notebook mode />
            <NotePane note breadcrumbs mode />
        </div>
    }
}

#[component]
fn NotebookPane(notebook: RwSignal<Notebook>, mode: RwSignal<ViewMode>) -> impl IntoView {
    let engine = expect_context::<EngineContext>().0;

    let query: RwSignal<String> = RwSignal::new(String::new());
    let filter: RwSignal<String> = RwSignal::new(String::new());

    let visible_notes = move || {
        let needle = filter.get().trim().to_lowercase();
        notebook
            .get()
            .notes
            .into_iter()
            .filter(|n| needle.is_empty() || n.title.to_lowercase().contains(&needle))
            .collect::<Vec<_>>()
    };

    view! {
        <aside class="notes">
            <h2 class="notebook-name">
                {move || notebook.get().name.unwrap_or_else(|| "\u{2026}".to_string())}
            </h2>

            <input
                class="search"
                type="search"
                placeholder="Search all notes"
                prop:value=move || query.get()
                on:input=move |ev| {
                    let q = event_target_value(&ev);
                    query.set(q.clone());
                    engine.with_value(|e| e.queue_search(&q));
                }
            />

            <input
                class="filter"
                type="text"
                placeholder="Filter this notebook"
                prop:value=move || filter.get()
                on:input=move |ev| filter.set(event_target_value(&ev))
            />

            <Show
                when=move || mode.get() != ViewMode::EmptyNotebook
                fallback=|| view! { <p class="empty">"This notebook has no notes yet."</p> }
            >
                <ul class="note-list">
                    {move || {
                        visible_notes()
                            .into_iter()
                            .map(|n| {
                                view! {
                                    <li>
                                        <a href=format!("/{}", n.url)>{n.title}</a>
                                    </li>
                                }
                            })
                            .collect_view()
                    }}
                </ul>
            </Show>
        </aside>
    }
}

#[component]
fn NotePane(
    note: RwSignal<Note>,
    breadcrumbs: RwSignal<Vec<Breadcrumb>>,
    mode: RwSignal<ViewMode>,
) -> impl IntoView {
    let engine = expect_context::<EngineContext>().0;
    let api = expect_context::<ApiContext>().0;
    let editor = expect_context::<EditorState>();

    // Copy handles only, so these handlers stay `Send` for the view tree.
    let on_edit = move |_| engine.with_value(|e| begin_edit(e, editor));
    let on_cancel = move |_| cancel_edit(editor);
    let on_save = move |_| save_edit(api.get_value(), engine.get_value(), editor);

    view! {
        <main class="note">
            <nav class="breadcrumbs">
                <a href="/">"home"</a>
                {move || {
                    breadcrumbs
                        .get()
                        .into_iter()
                        .map(|b| {
                            view! {
                                <span class="sep">"/"</span>
                                <a href=b.href>{b.label}</a>
                            }
                        })
                        .collect_view()
                }}
            </nav>

            <Show
                when=move || mode.get() == ViewMode::Reading
                fallback=|| view! { <p class="empty">"Nothing to show."</p> }
            >
                <article>
                    <h1 class="title">{move || note.get().title}</h1>

                    <Show
                        when=move || !editor.editing.get()
                        fallback=move || {
                            view! {
                                <div class="editor">
                                    <textarea
                                        class="plaintext-editor"
                                        prop:value=move || editor.draft.get()
                                        on:input=move |ev| editor.draft.set(event_target_value(&ev))
                                    ></textarea>
                                    <button
                                        class="js-save"
                                        disabled=move || editor.saving.get()
                                        on:click=on_save
                                    >
                                        {move || if editor.saving.get() { "Saving\u{2026}" } else { "Save" }}
                                    </button>
                                    <button class="js-cancel" on:click=on_cancel>"Cancel"</button>
                                </div>
                            }
                        }
                    >
                        <div class="content" inner_html=move || note.get().html></div>
                        <button class="js-edit" on:click=on_edit>"Edit"</button>
                    </Show>
                </article>
            </Show>
        </main>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "http://localhost:6789";

    #[test]
    fn test_route_target_accepts_notebooks_and_notes() {
        assert_eq!(
            route_target("http://localhost:6789/a/b/", ORIGIN),
            Some("a/b/".to_string())
        );
        assert_eq!(
            route_target("http://localhost:6789/a/b.md", ORIGIN),
            Some("a/b.md".to_string())
        );
        assert_eq!(
            route_target("http://localhost:6789/", ORIGIN),
            Some(String::new())
        );
    }

    #[test]
    fn test_route_target_rejects_other_origins_and_files() {
        assert_eq!(route_target("http://elsewhere.example/a/", ORIGIN), None);
        assert_eq!(
            route_target("http://localhost:6789/assets/photo.png", ORIGIN),
            None
        );
    }

    #[test]
    fn test_context_payloads_satisfy_provide_context_bound() {
        // `provide_context` requires `Send + Sync`. The Rc-based engine only
        // ever crosses that boundary as a `LocalStorage` arena handle, which
        // is thread-safe even though the engine itself is not.
        fn assert_context_payload<T: Send + Sync + 'static>() {}
        assert_context_payload::<EditorState>();
        assert_context_payload::<EngineContext>();
        assert_context_payload::<ApiContext>();
    }
}
