use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use walker_client::api::{WalkerApi, WalkerHttpClient};
use walker_client::config::ClientConfig;
use walker_client::controllers::{
    ActionOutcome, AuthState, HomeController, LoginController, RegisterController, ReviewsController,
    WalkList, WalksController,
};
use walker_client::models::Walk;
use walker_client::session::SessionStore;
use walker_client::state::ScreenState;

#[derive(Parser)]
#[command(name = "walker", about = "Walker client for the dog-walking service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session token
    Login { email: String, password: String },
    /// Create a walker account
    Register {
        name: String,
        email: String,
        password: String,
        price_hour: String,
    },
    /// Forget the stored session token
    Logout,
    /// Show the walker profile
    Home,
    /// Switch availability on or off
    Availability { state: Switch },
    /// Upload a profile photo
    ProfilePhoto { path: PathBuf },
    /// List pending, accepted and finished walks
    Walks,
    Accept { id: i64 },
    Reject { id: i64 },
    Start { id: i64 },
    End { id: i64 },
    /// List the photos of a walk
    Photos { id: i64 },
    /// Upload a photo to a walk
    UploadPhoto { id: i64, path: PathBuf },
    /// List reviews, newest first
    Reviews,
    /// Show one review
    Review { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "walker_client=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::new_from_env()?;
    info!("using walker service at {}", config.base_url);

    let session = Arc::new(SessionStore::open(&config.session_db_url).await?);
    let api: Arc<dyn WalkerApi> = Arc::new(WalkerHttpClient::new(&config)?);

    match cli.command {
        Command::Login { email, password } => {
            let login = LoginController::new(api, session);
            login.login(&email, &password).await;
            match login.state().current() {
                ScreenState::Success(()) if login.take_navigation() => println!("Sesión iniciada"),
                state => print_unit_state(&state),
            }
        }
        Command::Register {
            name,
            email,
            password,
            price_hour,
        } => {
            let register = RegisterController::new(api);
            register.register(&name, &email, &password, &price_hour).await;
            match register.state().current() {
                ScreenState::Success(()) => println!("Registro completado"),
                state => print_unit_state(&state),
            }
        }
        Command::Logout => {
            HomeController::new(api, session).logout().await?;
            println!("Sesión cerrada");
        }
        Command::Home => {
            let home = HomeController::new(api, session);
            home.load_user_info().await;
            match home.user_info().current() {
                ScreenState::Error(message) => println!("{}", message),
                state => {
                    let info = state.data().cloned().unwrap_or_default();
                    println!("{} ({})", info.display_name(), info.role_label());
                }
            }
        }
        Command::Availability { state } => {
            let home = HomeController::new(api, session);
            home.toggle_availability(matches!(state, Switch::On)).await;
            let available = *home.availability().borrow();
            println!("Disponible: {}", if available { "sí" } else { "no" });
        }
        Command::ProfilePhoto { path } => {
            let home = HomeController::new(api, session);
            print_outcome(&home.upload_profile_photo(&path).await);
        }
        Command::Walks => {
            let walks = WalksController::new(api, session);
            walks.load_all().await;
            print_walks(&walks);
        }
        Command::Accept { id } => {
            let walks = WalksController::new(api, session);
            print_outcome(&walks.accept(id).await);
        }
        Command::Reject { id } => {
            let walks = WalksController::new(api, session);
            print_outcome(&walks.reject(id).await);
        }
        Command::Start { id } => {
            let walks = WalksController::new(api, session);
            print_outcome(&walks.start(id).await);
        }
        Command::End { id } => {
            let walks = WalksController::new(api, session);
            print_outcome(&walks.end(id).await);
        }
        Command::Photos { id } => {
            let walks = WalksController::new(api, session);
            walks.open_walk(id).await;
            match walks.photos().current() {
                ScreenState::Success(urls) if urls.is_empty() => println!("Sin fotos"),
                ScreenState::Success(urls) => urls.iter().for_each(|url| println!("{}", url)),
                ScreenState::Error(message) => println!("{}", message),
                _ => {}
            }
        }
        Command::UploadPhoto { id, path } => {
            let walks = WalksController::new(api, session);
            print_outcome(&walks.upload_walk_photo(id, &path).await);
        }
        Command::Reviews => {
            let reviews = ReviewsController::new(api, session);
            reviews.load_reviews().await;
            match reviews.reviews().current() {
                ScreenState::Success(list) if list.is_empty() => {
                    println!("No hay reviews disponibles")
                }
                ScreenState::Success(list) => {
                    for review in list {
                        println!(
                            "#{} {}★ {} {}",
                            review.id,
                            review.rating.unwrap_or(0),
                            review.created_at.as_deref().unwrap_or("-"),
                            review.text.as_deref().unwrap_or("")
                        );
                    }
                }
                ScreenState::Error(message) => println!("{}", message),
                _ => {}
            }
        }
        Command::Review { id } => {
            let reviews = ReviewsController::new(api, session);
            reviews.open_review(id).await;
            match reviews.detail().current() {
                ScreenState::Success(review) => println!("{:#?}", review),
                ScreenState::Error(message) => println!("{}", message),
                _ => {}
            }
        }
    }

    Ok(())
}

fn print_unit_state(state: &AuthState) {
    if let Some(message) = state.error() {
        println!("{}", message);
    }
}

fn print_outcome(outcome: &ActionOutcome) {
    println!("{}", outcome.message());
}

fn print_walks(walks: &WalksController) {
    for (title, list) in [
        ("Pendientes", WalkList::Pending),
        ("Aceptados", WalkList::Accepted),
        ("Historial", WalkList::History),
    ] {
        println!("== {}", title);
        match walks.list(list).current() {
            ScreenState::Success(items) if items.is_empty() => println!("  (vacío)"),
            ScreenState::Success(items) => items.iter().for_each(print_walk),
            ScreenState::Error(message) => println!("  {}", message),
            _ => {}
        }
    }
}

fn print_walk(walk: &Walk) {
    println!(
        "  #{} {} {} min [{}]",
        walk.id,
        walk.scheduled_at.as_deref().unwrap_or("sin fecha"),
        walk.duration_minutes.unwrap_or(0),
        walk.status.as_deref().unwrap_or("?")
    );
}
