// client/src/app.rs
use std::{future::Future, sync::Arc};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::messages::{AdminMsg, Effect, LoginOutcome, Msg, PlayMsg, PollPlan, RegisterMsg};
use crate::poller::{Cadence, Poller, Sequencer};
use crate::router::{self, Route};
use crate::states::{AdminModel, PlayModel, RegisterModel, Screen};
use crate::storage::{self, KeyValueStore};

type Envelope = (u64, Msg);

/// Owns the mounted screen and runs the effects its reducer asks for.
///
/// Network calls run on spawned tasks and report back over a channel. Every
/// report carries the epoch it was started in; mounting a new screen bumps
/// the epoch, so anything still in flight for the old screen is dropped.
pub struct App {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,

    screen: Screen,
    location: String,
    epoch: u64,

    tx: mpsc::UnboundedSender<Envelope>,
    rx: mpsc::UnboundedReceiver<Envelope>,
    pollers: Vec<Poller>,
    alerts: Vec<String>,

    ticket_seq: Arc<Sequencer>,
    status_seq: Arc<Sequencer>,
    claims_seq: Arc<Sequencer>,
}

impl App {
    /// Resolves the first screen from `location` and stored state, then
    /// mounts it. Must be called inside a tokio runtime.
    pub fn start(api: ApiClient, store: Arc<dyn KeyValueStore>, location: impl Into<String>) -> Self {
        let location = location.into();
        let route = router::resolve(&location, storage::load_ticket_id(store.as_ref()).as_deref());
        info!("starting at {} -> {:?}", location, route);

        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = Self {
            api,
            store,
            screen: Screen::Register(RegisterModel::default()),
            location,
            epoch: 0,
            tx,
            rx,
            pollers: Vec::new(),
            alerts: Vec::new(),
            ticket_seq: Sequencer::new(),
            status_seq: Sequencer::new(),
            claims_seq: Sequencer::new(),
        };
        app.mount(route);
        app
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Current path and query, updated when a player is sent to their ticket.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn pollers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pollers.iter().filter(|p| p.is_running()).map(|p| p.name())
    }

    /// Alerts raised since the last call, oldest first.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// Feeds a message to the mounted screen. Messages meant for another
    /// screen are ignored.
    pub fn dispatch(&mut self, msg: Msg) {
        let effects = match (&mut self.screen, msg) {
            (Screen::Register(model), Msg::Register(msg)) => model.update(msg),
            (Screen::Play(model), Msg::Play(msg)) => model.update(msg),
            (Screen::Admin(model), Msg::Admin(msg)) => model.update(msg),
            (screen, msg) => {
                debug!("dropping {:?} on {} screen", msg, screen.title());
                return;
            }
        };
        self.run(effects);
    }

    /// Waits for the next background result belonging to the current screen
    /// and applies it. Returns false once no more results can arrive.
    pub async fn next_event(&mut self) -> bool {
        while let Some((epoch, msg)) = self.rx.recv().await {
            if epoch != self.epoch {
                debug!("discarding late {:?} from epoch {}", msg, epoch);
                continue;
            }
            self.dispatch(msg);
            return true;
        }
        false
    }

    fn mount(&mut self, route: Route) {
        self.epoch += 1;
        self.pollers.clear();

        let (screen, effects) = match route {
            Route::Register => {
                let (model, effects) = RegisterModel::init();
                (Screen::Register(model), effects)
            }
            Route::Play(ticket_id) => {
                let marks = storage::load_marks(self.store.as_ref(), &ticket_id);
                let (model, effects) = PlayModel::init(ticket_id, marks);
                (Screen::Play(model), effects)
            }
            Route::Admin => {
                let (model, effects) = AdminModel::init();
                (Screen::Admin(model), effects)
            }
        };
        debug!("mounted {} (epoch {})", screen.title(), self.epoch);
        self.screen = screen;
        self.run(effects);
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Option<Msg>> + Send + 'static,
    {
        let tx = self.tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            if let Some(msg) = task.await {
                let _ = tx.send((epoch, msg));
            }
        });
    }

    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            let leaving = matches!(effect, Effect::Navigate(_));
            self.execute(effect);
            if leaving {
                // the rest belonged to the screen that just went away
                return;
            }
        }
    }

    fn navigate(&mut self, route: Route) {
        if let Route::Play(ticket_id) = &route {
            self.location = router::play_location(ticket_id);
        }
        self.mount(route);
    }

    fn execute(&mut self, effect: Effect) {
        let api = self.api.clone();
        match effect {
            Effect::Navigate(route) => self.navigate(route),

            Effect::LoadNames => self.spawn(async move {
                match api.names().await {
                    Ok(names) => Some(Msg::Register(RegisterMsg::NamesLoaded(names))),
                    Err(e) => {
                        warn!("could not load names: {}", e);
                        None
                    }
                }
            }),
            Effect::Register(name) => self.spawn(async move {
                Some(Msg::Register(match api.register(&name).await {
                    Ok(resp) => RegisterMsg::Registered(resp.ticket_id),
                    Err(e) => {
                        warn!("registration failed: {}", e);
                        RegisterMsg::RegisterFailed(e.detail().unwrap_or_default().to_string())
                    }
                }))
            }),
            Effect::PersistTicket(ticket_id) => {
                if let Err(e) = storage::save_ticket_id(self.store.as_ref(), &ticket_id) {
                    warn!("could not persist ticket id: {}", e);
                }
            }

            Effect::LoadTicket(ticket_id) => {
                let seq = self.ticket_seq.issue();
                self.spawn(async move {
                    Some(Msg::Play(match api.ticket(&ticket_id).await {
                        Ok(ticket) => PlayMsg::TicketLoaded { seq, ticket },
                        Err(e) => {
                            warn!("could not load ticket {}: {}", ticket_id, e);
                            PlayMsg::TicketFailed { seq, error: e.to_string() }
                        }
                    }))
                });
            }
            Effect::SaveMarks { ticket_id, marks } => {
                if let Err(e) = storage::save_marks(self.store.as_ref(), &ticket_id, &marks) {
                    warn!("could not save marks: {}", e);
                }
            }
            Effect::SubmitClaim(ticket_id) => self.spawn(async move {
                let result = api.claim(&ticket_id).await.map_err(|e| {
                    warn!("claim for {} failed: {}", ticket_id, e);
                    e.to_string()
                });
                Some(Msg::Play(PlayMsg::ClaimFinished(result)))
            }),

            Effect::Login(password) => self.spawn(async move {
                let outcome = match api.admin_login(&password).await {
                    Ok(()) => LoginOutcome::Accepted,
                    Err(ApiError::Status { status, .. }) => {
                        debug!("login refused with {}", status);
                        LoginOutcome::Rejected
                    }
                    Err(e) => {
                        warn!("login failed: {}", e);
                        LoginOutcome::Failed
                    }
                };
                Some(Msg::Admin(AdminMsg::LoginFinished(outcome)))
            }),
            Effect::LoadQr => self.spawn(async move {
                match api.qr_code().await {
                    Ok(qr) => Some(Msg::Admin(AdminMsg::QrLoaded(qr))),
                    Err(e) => {
                        warn!("could not load QR code: {}", e);
                        None
                    }
                }
            }),
            Effect::LoadStatus => {
                if let Some(plan) = self.poll_plan() {
                    self.spawn(fetch_status(api, self.status_seq.clone(), plan));
                }
            }
            Effect::LoadClaims => self.spawn(fetch_claims(api, self.claims_seq.clone())),
            Effect::PickName => self.spawn(async move {
                let pick = match api.pick_name().await {
                    Ok(pick) => pick,
                    Err(e) => {
                        warn!("pick failed: {}", e);
                        return Some(Msg::Admin(AdminMsg::PickFailed(e.to_string())));
                    }
                };
                let profile = api.profile(&pick.picked_name).await.unwrap_or_else(|e| {
                    debug!("no profile for {}: {}", pick.picked_name, e);
                    Default::default()
                });
                Some(Msg::Admin(AdminMsg::Picked { pick, profile }))
            }),
            Effect::VerifyClaim { claim_id, is_valid } => self.spawn(async move {
                Some(Msg::Admin(match api.verify_claim(claim_id, is_valid).await {
                    Ok(()) => AdminMsg::Verified,
                    Err(e) => {
                        warn!("verifying claim {} failed: {}", claim_id, e);
                        AdminMsg::VerifyFailed(e.to_string())
                    }
                }))
            }),
            Effect::ResetGame => self.spawn(async move {
                let result = api.reset_game().await.map_err(|e| {
                    warn!("reset failed: {}", e);
                    e.to_string()
                });
                Some(Msg::Admin(AdminMsg::ResetFinished(result)))
            }),

            Effect::StartPolling(plan) => self.start_polling(plan),
            Effect::Alert(text) => {
                info!("alert: {}", text);
                self.alerts.push(text);
            }
        }
    }

    fn poll_plan(&self) -> Option<PollPlan> {
        match self.screen {
            Screen::Register(_) => None,
            Screen::Play(_) => Some(PollPlan::Play),
            Screen::Admin(_) => Some(PollPlan::Admin),
        }
    }

    /// Fetches once right away, then keeps polling until the screen changes.
    fn start_polling(&mut self, plan: PollPlan) {
        let tx = self.tx.clone();
        let epoch = self.epoch;
        let api = self.api.clone();
        let status_seq = self.status_seq.clone();
        let claims_seq = self.claims_seq.clone();

        let (name, cadence) = match plan {
            PollPlan::Play => ("play-status", Cadence::PLAY),
            PollPlan::Admin => ("admin-status", Cadence::ADMIN),
        };
        let tick = move || {
            let tx = tx.clone();
            let api = api.clone();
            let status_seq = status_seq.clone();
            let claims_seq = claims_seq.clone();
            async move {
                let messages = match plan {
                    PollPlan::Play => vec![fetch_status(api, status_seq, plan).await],
                    PollPlan::Admin => {
                        let (status, claims) = futures::join!(
                            fetch_status(api.clone(), status_seq, plan),
                            fetch_claims(api, claims_seq)
                        );
                        vec![status, claims]
                    }
                };
                for msg in messages.into_iter().flatten() {
                    let _ = tx.send((epoch, msg));
                }
            }
        };

        tokio::spawn(tick());
        self.pollers.push(Poller::start(name, cadence, tick));
    }
}

async fn fetch_status(api: ApiClient, seq: Arc<Sequencer>, plan: PollPlan) -> Option<Msg> {
    let seq = seq.issue();
    match api.game_status().await {
        Ok(status) => Some(match plan {
            PollPlan::Play => Msg::Play(PlayMsg::StatusLoaded { seq, status }),
            PollPlan::Admin => Msg::Admin(AdminMsg::StatusLoaded { seq, status }),
        }),
        Err(e) => {
            debug!("status poll failed: {}", e);
            None
        }
    }
}

async fn fetch_claims(api: ApiClient, seq: Arc<Sequencer>) -> Option<Msg> {
    let seq = seq.issue();
    match api.claims().await {
        Ok(claims) => Some(Msg::Admin(AdminMsg::ClaimsLoaded { seq, claims })),
        Err(e) => {
            debug!("claims poll failed: {}", e);
            None
        }
    }
}
