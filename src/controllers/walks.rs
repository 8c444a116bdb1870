use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::api::{PhotoUpload, WalkerApi};
use crate::controllers::home::{PHOTO_UPLOAD_FAILED, PHOTO_UPLOADED};
use crate::controllers::{ActionGuard, ActionOutcome, Screen};
use crate::error::{ApiError, UNAUTHENTICATED_MESSAGE};
use crate::models::{Walk, finished_walks};
use crate::session::SessionStore;
use crate::state::{ScreenState, StateStream};

/// One of the three independently fetched lists on the walks screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkList {
    Pending,
    Accepted,
    History,
}

impl WalkList {
    pub const ALL: [WalkList; 3] = [WalkList::Pending, WalkList::Accepted, WalkList::History];

    fn label(self) -> &'static str {
        match self {
            WalkList::Pending => "pendientes",
            WalkList::Accepted => "aceptados",
            WalkList::History => "historial",
        }
    }

    async fn fetch(self, api: &dyn WalkerApi, token: &str) -> Result<Vec<Walk>, ApiError> {
        match self {
            WalkList::Pending => api.get_pending_walks(token).await,
            WalkList::Accepted => api.get_accepted_walks(token).await,
            WalkList::History => api.get_all_walks(token).await.map(finished_walks),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WalkAction {
    Accept,
    Reject,
    Start,
    End,
}

impl WalkAction {
    async fn perform(self, api: &dyn WalkerApi, token: &str, id: i64) -> Result<(), ApiError> {
        match self {
            WalkAction::Accept => api.accept_walk(token, id).await,
            WalkAction::Reject => api.reject_walk(token, id).await,
            WalkAction::Start => api.start_walk(token, id).await,
            WalkAction::End => api.end_walk(token, id).await,
        }
    }

    fn affected(self) -> &'static [WalkList] {
        match self {
            WalkAction::Accept => &[WalkList::Pending, WalkList::Accepted],
            WalkAction::Reject => &[WalkList::Pending],
            WalkAction::Start => &[WalkList::Accepted],
            WalkAction::End => &[WalkList::Accepted, WalkList::History],
        }
    }

    fn success_message(self, id: i64) -> String {
        match self {
            WalkAction::Accept => "Paseo aceptado".to_string(),
            WalkAction::Reject => "Paseo rechazado".to_string(),
            WalkAction::Start => "Paseo iniciado".to_string(),
            WalkAction::End => format!("Paseo #{} finalizado", id),
        }
    }

    fn failure_prefix(self) -> &'static str {
        match self {
            WalkAction::Accept => "Error al aceptar",
            WalkAction::Reject => "Error al rechazar",
            WalkAction::Start => "No se pudo iniciar",
            WalkAction::End => "No se pudo finalizar",
        }
    }
}

fn list_state(list: WalkList, result: Result<Vec<Walk>, ApiError>) -> ScreenState<Vec<Walk>> {
    match result {
        Ok(walks) => ScreenState::Success(walks),
        Err(e) if e.is_decode() => {
            warn!("ignoring malformed {} response: {}", list.label(), e);
            ScreenState::Success(Vec::new())
        }
        Err(e) => {
            warn!("failed to load {}: {}", list.label(), e);
            ScreenState::Error(e.stream_message(list.label()))
        }
    }
}

/// Pending, accepted and finished walks, plus the detail view of one walk.
///
/// The three lists are fetched as sibling tasks that never cancel each
/// other. Accept, reject, start and end share one in-progress flag, so a
/// second submission while one is in flight is dropped rather than queued.
pub struct WalksController {
    api: Arc<dyn WalkerApi>,
    session: Arc<SessionStore>,
    pending: StateStream<Vec<Walk>>,
    accepted: StateStream<Vec<Walk>>,
    history: StateStream<Vec<Walk>>,
    photos: StateStream<Vec<String>>,
    action_in_progress: AtomicBool,
    upload_in_progress: AtomicBool,
}

impl WalksController {
    pub fn new(api: Arc<dyn WalkerApi>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            session,
            pending: StateStream::new(),
            accepted: StateStream::new(),
            history: StateStream::new(),
            photos: StateStream::new(),
            action_in_progress: AtomicBool::new(false),
            upload_in_progress: AtomicBool::new(false),
        }
    }

    pub fn list(&self, list: WalkList) -> &StateStream<Vec<Walk>> {
        match list {
            WalkList::Pending => &self.pending,
            WalkList::Accepted => &self.accepted,
            WalkList::History => &self.history,
        }
    }

    pub fn photos(&self) -> &StateStream<Vec<String>> {
        &self.photos
    }

    /// Fetches all three lists from scratch, showing Loading meanwhile.
    pub async fn load_all(&self) {
        let Some(token) = self.session.token() else {
            for list in WalkList::ALL {
                self.list(list)
                    .set(ScreenState::Error(UNAUTHENTICATED_MESSAGE.to_string()));
            }
            return;
        };
        self.refresh(&WalkList::ALL, &token, true).await;
    }

    async fn refresh(&self, lists: &[WalkList], token: &str, show_loading: bool) {
        let mut tasks = Vec::with_capacity(lists.len());

        for &list in lists {
            let stream = self.list(list).clone();
            if show_loading {
                stream.set(ScreenState::Loading);
            }
            let api = Arc::clone(&self.api);
            let token = token.to_string();

            let task = tokio::spawn(async move {
                let result = list.fetch(api.as_ref(), &token).await;
                stream.set(list_state(list, result));
            });
            tasks.push((list, task));
        }

        for (list, task) in tasks {
            if let Err(e) = task.await {
                error!("{} fetch task aborted: {}", list.label(), e);
                self.list(list)
                    .set(ScreenState::Error(format!("Error {}", list.label())));
            }
        }
    }

    pub async fn accept(&self, id: i64) -> ActionOutcome {
        self.run(WalkAction::Accept, id).await
    }

    pub async fn reject(&self, id: i64) -> ActionOutcome {
        self.run(WalkAction::Reject, id).await
    }

    pub async fn start(&self, id: i64) -> ActionOutcome {
        self.run(WalkAction::Start, id).await
    }

    /// Drops the walk from the accepted snapshot right away, then re-fetches
    /// accepted and history.
    pub async fn end(&self, id: i64) -> ActionOutcome {
        self.run(WalkAction::End, id).await
    }

    async fn run(&self, action: WalkAction, id: i64) -> ActionOutcome {
        let Some(_guard) = ActionGuard::acquire(&self.action_in_progress) else {
            debug!("{:?} on walk {} dropped, another action is in flight", action, id);
            return ActionOutcome::Busy;
        };
        let Some(token) = self.session.token() else {
            return ActionOutcome::Failed(UNAUTHENTICATED_MESSAGE.to_string());
        };

        if let Err(e) = action.perform(self.api.as_ref(), &token, id).await {
            warn!("{:?} on walk {} failed: {}", action, id, e);
            return ActionOutcome::Failed(e.action_message(action.failure_prefix()));
        }
        info!("{:?} on walk {} done", action, id);

        if action == WalkAction::End {
            self.accepted.modify(|state| {
                if let ScreenState::Success(walks) = state {
                    walks.retain(|walk| walk.id != id);
                }
            });
        }
        self.refresh(action.affected(), &token, false).await;

        ActionOutcome::Completed(action.success_message(id))
    }

    /// Opens the detail of a walk and loads its photos. A failed photo
    /// fetch shows an empty gallery.
    pub async fn open_walk(&self, id: i64) {
        let Some(token) = self.session.token() else {
            self.photos
                .set(ScreenState::Error(UNAUTHENTICATED_MESSAGE.to_string()));
            return;
        };
        self.photos.set(ScreenState::Loading);
        self.load_photos(&token, id).await;
    }

    async fn load_photos(&self, token: &str, id: i64) {
        match self.api.get_walk_photos(token, id).await {
            Ok(urls) => self.photos.set(ScreenState::Success(urls)),
            Err(e) => {
                warn!("failed to load photos for walk {}: {}", id, e);
                self.photos.set(ScreenState::Success(Vec::new()));
            }
        }
    }

    pub async fn upload_walk_photo(&self, id: i64, path: &Path) -> ActionOutcome {
        let Some(_guard) = ActionGuard::acquire(&self.upload_in_progress) else {
            return ActionOutcome::Busy;
        };
        let Some(token) = self.session.token() else {
            return ActionOutcome::Failed(UNAUTHENTICATED_MESSAGE.to_string());
        };

        let photo = match PhotoUpload::from_path(path).await {
            Ok(photo) => photo,
            Err(e) => {
                warn!("{}", e);
                return ActionOutcome::Failed(e.action_message(PHOTO_UPLOAD_FAILED));
            }
        };

        match self.api.upload_walk_photo(&token, id, photo).await {
            Ok(()) => {
                info!("photo uploaded for walk {}", id);
                self.load_photos(&token, id).await;
                ActionOutcome::Completed(PHOTO_UPLOADED.to_string())
            }
            Err(e) => {
                warn!("photo upload for walk {} failed: {}", id, e);
                ActionOutcome::Failed(e.action_message(PHOTO_UPLOAD_FAILED))
            }
        }
    }
}

#[async_trait]
impl Screen for WalksController {
    async fn load(&self) {
        self.load_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::{FakeApi, Failure, session_with_token, walk};

    async fn controller(api: &Arc<FakeApi>, token: Option<&str>) -> WalksController {
        WalksController::new(api.clone(), session_with_token(token).await)
    }

    fn ids(state: ScreenState<Vec<Walk>>) -> Vec<i64> {
        state
            .data()
            .map(|walks| walks.iter().map(|w| w.id).collect())
            .unwrap_or_default()
    }

    fn seeded() -> Arc<FakeApi> {
        let api = Arc::new(FakeApi::default());
        *api.pending.lock().unwrap() = vec![walk(1, "pending"), walk(2, "pending")];
        *api.accepted.lock().unwrap() = vec![walk(3, "accepted")];
        *api.all.lock().unwrap() = vec![
            walk(1, "pending"),
            walk(3, "accepted"),
            walk(4, "ended"),
            walk(5, "completed"),
            walk(6, "cancelled"),
        ];
        api
    }

    #[tokio::test]
    async fn load_fills_each_list() {
        let api = seeded();
        let walks = controller(&api, Some("abc")).await;

        walks.load_all().await;

        assert_eq!(ids(walks.list(WalkList::Pending).current()), vec![1, 2]);
        assert_eq!(ids(walks.list(WalkList::Accepted).current()), vec![3]);
        assert_eq!(ids(walks.list(WalkList::History).current()), vec![4, 5]);
    }

    #[tokio::test]
    async fn each_failure_combination_stays_isolated() {
        let endpoints = [
            (WalkList::Pending, "pending"),
            (WalkList::Accepted, "accepted"),
            (WalkList::History, "all"),
        ];

        for mask in 0u8..8 {
            let api = seeded();
            for (bit, (_, endpoint)) in endpoints.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    api.fail(*endpoint, Failure::Status(500));
                }
            }
            let walks = controller(&api, Some("abc")).await;
            walks.load_all().await;

            for (bit, (list, _)) in endpoints.iter().enumerate() {
                let state = walks.list(*list).current();
                if mask & (1 << bit) != 0 {
                    assert!(state.error().is_some(), "mask {} list {:?}", mask, list);
                } else {
                    assert!(state.data().is_some(), "mask {} list {:?}", mask, list);
                }
            }
        }
    }

    #[tokio::test]
    async fn error_messages_name_the_list() {
        let api = seeded();
        api.fail("pending", Failure::Status(503));
        api.fail("accepted", Failure::Network);
        let walks = controller(&api, Some("abc")).await;

        walks.load_all().await;

        assert_eq!(
            walks.list(WalkList::Pending).current().error(),
            Some("Error pendientes: 503")
        );
        assert_eq!(
            walks.list(WalkList::Accepted).current().error(),
            Some("Error de red (aceptados)")
        );
    }

    #[tokio::test]
    async fn malformed_list_reads_as_empty() {
        let api = seeded();
        api.fail("pending", Failure::Decode);
        let walks = controller(&api, Some("abc")).await;

        walks.load_all().await;

        assert_eq!(
            walks.list(WalkList::Pending).current(),
            ScreenState::Success(Vec::new())
        );
    }

    #[tokio::test]
    async fn panicked_fetch_only_fails_its_own_list() {
        let api = seeded();
        api.fail("accepted", Failure::Panic);
        let walks = controller(&api, Some("abc")).await;

        walks.load_all().await;

        assert_eq!(
            walks.list(WalkList::Accepted).current(),
            ScreenState::Error("Error aceptados".to_string())
        );
        assert_eq!(ids(walks.list(WalkList::Pending).current()), vec![1, 2]);
        assert_eq!(ids(walks.list(WalkList::History).current()), vec![4, 5]);
    }

    #[tokio::test]
    async fn no_token_short_circuits_without_requests() {
        let api = seeded();
        let walks = controller(&api, None).await;

        walks.load_all().await;
        walks.open_walk(3).await;

        for list in WalkList::ALL {
            assert_eq!(
                walks.list(list).current().error(),
                Some(UNAUTHENTICATED_MESSAGE)
            );
        }
        assert_eq!(walks.photos().current().error(), Some(UNAUTHENTICATED_MESSAGE));
        assert_eq!(
            walks.accept(1).await,
            ActionOutcome::Failed(UNAUTHENTICATED_MESSAGE.to_string())
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn accept_refetches_pending_and_accepted() {
        let api = seeded();
        let walks = controller(&api, Some("abc")).await;
        walks.load_all().await;

        let outcome = walks.accept(1).await;

        assert_eq!(outcome, ActionOutcome::Completed("Paseo aceptado".to_string()));
        assert_eq!(ids(walks.list(WalkList::Pending).current()), vec![2]);
        assert_eq!(ids(walks.list(WalkList::Accepted).current()), vec![3, 1]);
        assert_eq!(api.count("pending"), 2);
        assert_eq!(api.count("accepted"), 2);
        assert_eq!(api.count("all"), 1);
    }

    #[tokio::test]
    async fn concurrent_accept_is_rejected_while_first_in_flight() {
        let api = seeded();
        let release = api.hold("accept");
        let walks = Arc::new(controller(&api, Some("abc")).await);

        let first = tokio::spawn({
            let walks = Arc::clone(&walks);
            async move { walks.accept(1).await }
        });
        while api.count("accept") == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(walks.accept(1).await, ActionOutcome::Busy);
        assert_eq!(walks.reject(2).await, ActionOutcome::Busy);

        release.notify_one();
        assert_eq!(
            first.await.unwrap(),
            ActionOutcome::Completed("Paseo aceptado".to_string())
        );
        assert_eq!(api.count("accept"), 1);
        assert_eq!(api.count("reject"), 0);

        assert_eq!(walks.reject(2).await, ActionOutcome::Completed("Paseo rechazado".to_string()));
    }

    #[tokio::test]
    async fn end_removes_locally_before_refetch_completes() {
        let api = seeded();
        let walks = Arc::new(controller(&api, Some("abc")).await);
        walks.load_all().await;
        assert_eq!(ids(walks.list(WalkList::Accepted).current()), vec![3]);

        let release = api.hold("accepted");
        let ending = tokio::spawn({
            let walks = Arc::clone(&walks);
            async move { walks.end(3).await }
        });
        while api.count("accepted") < 2 {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            walks.list(WalkList::Accepted).current(),
            ScreenState::Success(Vec::new())
        );

        release.notify_one();
        assert_eq!(
            ending.await.unwrap(),
            ActionOutcome::Completed("Paseo #3 finalizado".to_string())
        );
        assert_eq!(ids(walks.list(WalkList::History).current()), vec![4, 5, 3]);
    }

    #[tokio::test]
    async fn failed_action_reports_status_and_skips_refetch() {
        let api = seeded();
        api.fail("start", Failure::Status(409));
        let walks = controller(&api, Some("abc")).await;

        let outcome = walks.start(3).await;

        assert_eq!(outcome, ActionOutcome::Failed("No se pudo iniciar: 409".to_string()));
        assert_eq!(api.count("accepted"), 0);
    }

    #[tokio::test]
    async fn upload_reloads_photos() {
        let api = seeded();
        *api.photos.lock().unwrap() = vec!["https://cdn.test/walks/3/a.jpg".to_string()];
        let walks = controller(&api, Some("abc")).await;
        walks.open_walk(3).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.jpg");
        std::fs::write(&path, b"\xff\xd8\xff").unwrap();

        let outcome = walks.upload_walk_photo(3, &path).await;

        assert_eq!(outcome, ActionOutcome::Completed(PHOTO_UPLOADED.to_string()));
        assert_eq!(
            walks.photos().current(),
            ScreenState::Success(vec![
                "https://cdn.test/walks/3/a.jpg".to_string(),
                "https://cdn.test/walks/3/b.jpg".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn photo_failure_shows_empty_gallery() {
        let api = seeded();
        api.fail("photos", Failure::Network);
        let walks = controller(&api, Some("abc")).await;

        walks.open_walk(3).await;

        assert_eq!(walks.photos().current(), ScreenState::Success(Vec::new()));
    }
}
