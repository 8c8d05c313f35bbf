use crate::pages::{
    DocStudioPage, LoginPage, RegistrationPage, RootAuthed, RootPage, SlideStudioPage,
};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // IMPORTANT:
    // - Leptos CSR requires the `csr` feature on `leptos`.
    // - router hooks require a <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("signup") view=RegistrationPage />
                <Route path=path!("ppt") view=move || view! {
                    <RootAuthed>
                        <SlideStudioPage />
                    </RootAuthed>
                } />
                <Route path=path!("ppt/:id") view=move || view! {
                    <RootAuthed>
                        <SlideStudioPage />
                    </RootAuthed>
                } />
                <Route path=path!("doc") view=move || view! {
                    <RootAuthed>
                        <DocStudioPage />
                    </RootAuthed>
                } />
                <Route path=path!("doc/:id") view=move || view! {
                    <RootAuthed>
                        <DocStudioPage />
                    </RootAuthed>
                } />
                <Route path=path!("") view=RootPage />
            </Routes>
        </Router>
    }
}
