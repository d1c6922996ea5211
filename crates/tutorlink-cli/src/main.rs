use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use tutorlink_api::{ApiClient, PushSubscription};
use tutorlink_application::{AuthUseCase, NotificationService, PollHandle, TutoringUseCase};
use tutorlink_core::notification::{
    NotificationSink, ProposalDecision, ProposalNotification, ProposalStatusNotification,
};
use tutorlink_core::session::SessionManager;
use tutorlink_core::user::{PasswordReset, SignupDetails};
use tutorlink_infrastructure::{ConfigLoader, TomlSessionStore, TutorlinkPaths};

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: [
                "/login", "/signup", "/forgot", "/reset", "/learn", "/tutor", "/topics",
                "/propose", "/profile", "/yes", "/no", "/dismiss", "/push", "/stats", "/logout",
                "/help",
            ]
            .iter()
            .map(|cmd| cmd.to_string())
            .collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Events the notification service pushes into the REPL.
enum UiEvent {
    Proposal(ProposalNotification),
    Status(ProposalStatusNotification),
}

/// Sink that forwards notification events into the REPL's channel.
struct ChannelSink {
    tx: mpsc::Sender<UiEvent>,
}

#[async_trait::async_trait]
impl NotificationSink for ChannelSink {
    async fn proposal_received(&self, proposal: ProposalNotification) {
        let _ = self.tx.send(UiEvent::Proposal(proposal)).await;
    }

    async fn proposal_status_changed(&self, status: ProposalStatusNotification) {
        let _ = self.tx.send(UiEvent::Status(status)).await;
    }
}

fn print_help(logged_in: bool) {
    if logged_in {
        println!("{}", "Commands:".bright_black());
        println!("{}", "  /learn    submit a learning request".bright_black());
        println!("{}", "  /tutor    submit a tutor offer".bright_black());
        println!("{}", "  /topics   browse requested topics".bright_black());
        println!("{}", "  /propose  offer a session for a topic".bright_black());
        println!("{}", "  /profile  show your profile".bright_black());
        println!("{}", "  /yes /no  answer a pending tutoring offer".bright_black());
        println!("{}", "  /dismiss  dismiss a pending offer without answering".bright_black());
        println!("{}", "  /push     switch notifications to the push channel".bright_black());
        println!("{}", "  /stats    show notification poll counters".bright_black());
        println!("{}", "  /logout   log out, 'quit' to exit".bright_black());
    } else {
        println!("{}", "Commands:".bright_black());
        println!("{}", "  /login    log in".bright_black());
        println!("{}", "  /signup   create an account".bright_black());
        println!("{}", "  /forgot   request a password reset link".bright_black());
        println!("{}", "  /reset    set a new password with a reset token".bright_black());
        println!("{}", "  'quit' to exit".bright_black());
    }
}

fn show_error(message: impl std::fmt::Display) {
    eprintln!("{}", format!("{message}").red());
}

type Repl = Editor<CliHelper, rustyline::history::DefaultHistory>;

/// Reads one form field. A cancelled prompt (Ctrl-C/Ctrl-D) yields an
/// empty answer, which the use-case validation turns into a message.
fn prompt(rl: &mut Repl, label: &str) -> Result<String> {
    match rl.readline(&format!("{label}: ")) {
        Ok(line) => Ok(line.trim().to_string()),
        Err(rustyline::error::ReadlineError::Interrupted)
        | Err(rustyline::error::ReadlineError::Eof) => Ok(String::new()),
        Err(err) => Err(err.into()),
    }
}

fn prompt_with_default(rl: &mut Repl, label: &str, default: &str) -> Result<String> {
    let answer = prompt(rl, &format!("{label} [{default}]"))?;
    if answer.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(answer)
    }
}

/// The main entry point for the TutorLink REPL client.
///
/// Sets up a rustyline-based REPL that:
/// 1. Initializes the API client, session store, and use cases
/// 2. Restores a persisted session or walks the user through login
/// 3. Starts the notification poll loop for the logged-in user
/// 4. Surfaces proposal dialogs and status messages from a channel
/// 5. Relays /yes, /no, and /dismiss to the notification service
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // ===== Backend Initialization =====
    let paths = TutorlinkPaths::new()?;
    let config = ConfigLoader::new(paths.config_file()).load()?;
    tracing::info!("[Cli] Using backend {}", config.backend_url);
    let api = ApiClient::new(&config.backend_url).with_timeout(config.request_timeout());
    let sessions = SessionManager::new(Arc::new(TomlSessionStore::new(paths.session_file())));

    let auth = AuthUseCase::new(api.clone(), sessions.clone());
    let tutoring = TutoringUseCase::new(api.clone(), sessions.clone());

    // Channel from the notification service into this loop
    let (event_tx, mut event_rx) = mpsc::channel::<UiEvent>(16);
    let notifier = NotificationService::new(
        api.clone(),
        sessions.clone(),
        Arc::new(ChannelSink { tx: event_tx }),
    );

    // Display handler: prints notifications as they arrive
    let display_handler: JoinHandle<()> = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                UiEvent::Proposal(proposal) => {
                    println!();
                    println!("{}", "New Tutoring Offer!".bright_yellow().bold());
                    println!("  {} {}", "Tutor:".bold(), proposal.tutor_name);
                    println!("  {} {}", "Tutor Points:".bold(), proposal.tutor_points);
                    println!("  {} {}", "Topic:".bold(), proposal.topic);
                    println!("  {} {}", "Date:".bold(), proposal.date);
                    println!("  {} {}", "Time:".bold(), proposal.time);
                    println!(
                        "{}",
                        "Are you okay with this tutor, date, and time? (/yes, /no, /dismiss)"
                            .bright_yellow()
                    );
                }
                UiEvent::Status(status) => {
                    println!();
                    println!(
                        "{}",
                        format!(
                            "Your offer for the topic \"{}\" was {} by student {}.",
                            status.topic, status.status, status.recipient
                        )
                        .bright_blue()
                    );
                }
            }
        }
    });

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl: Repl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== TutorLink ===".bright_magenta().bold());

    let mut logged_in = match auth.restore().await {
        Ok(Some(context)) => {
            println!(
                "{}",
                format!("Welcome back, {}!", context.display_name).bright_green()
            );
            true
        }
        Ok(None) => false,
        Err(err) => {
            show_error(format!("Could not restore session: {err}"));
            false
        }
    };

    let mut poll_handle: Option<PollHandle> = if logged_in {
        notifier.start(config.poll_interval())
    } else {
        None
    };
    let mut push_task: Option<JoinHandle<()>> = None;

    print_help(logged_in);
    println!();

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        let line = match readline {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                show_error(format!("Error: {err:?}"));
                break;
            }
        };

        let trimmed = line.trim().to_string();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            println!("{}", "Goodbye!".bright_green());
            break;
        }
        let _ = rl.add_history_entry(&line);

        if !logged_in {
            match trimmed.as_str() {
                "/login" => {
                    let username = prompt(&mut rl, "Username")?;
                    let password = prompt(&mut rl, "Password")?;
                    match auth.login(&username, &password).await {
                        Ok(context) => {
                            println!(
                                "{}",
                                format!("Welcome, {}!", context.display_name).bright_green()
                            );
                            logged_in = true;
                            poll_handle = notifier.start(config.poll_interval());
                            print_help(true);
                        }
                        Err(err) => show_error(err),
                    }
                }
                "/signup" => {
                    let details = SignupDetails {
                        name: prompt(&mut rl, "Name")?,
                        username: prompt(&mut rl, "Username")?,
                        email: prompt(&mut rl, "Email")?,
                        password: prompt(&mut rl, "Password")?,
                    };
                    match auth.signup(details).await {
                        Ok(message) => {
                            println!("{}", format!("{message} Please log in.").bright_green())
                        }
                        Err(err) => show_error(format!("Signup failed: {err}")),
                    }
                }
                "/forgot" => {
                    let email = prompt(&mut rl, "Registered email")?;
                    match auth.request_password_reset(&email).await {
                        Ok(message) => println!("{}", message.bright_green()),
                        Err(err) => show_error(err),
                    }
                }
                "/reset" => {
                    let reset = PasswordReset {
                        token: prompt(&mut rl, "Reset token")?,
                        new_password: prompt(&mut rl, "New password")?,
                        confirm_password: prompt(&mut rl, "Confirm password")?,
                    };
                    match auth.reset_password(reset).await {
                        Ok(message) => println!("{}", message.bright_green()),
                        Err(err) => show_error(format!("Error resetting password: {err}")),
                    }
                }
                "/help" => print_help(false),
                _ => println!("{}", "Please log in first (/login or /signup).".bright_black()),
            }
            continue;
        }

        match trimmed.as_str() {
            "/learn" => {
                let topic = prompt(&mut rl, "Topic")?;
                let file_name = prompt(&mut rl, "File name")?;
                match tutoring.submit_learn_request(&topic, &file_name).await {
                    Ok(()) => println!("{}", "Learning request submitted!".bright_green()),
                    Err(err) => show_error(format!("Failed to submit request: {err}")),
                }
            }
            "/tutor" => {
                // Prefill from the session, like the web form did
                let (default_name, default_number) = match sessions.current().await {
                    Some(session) => (session.display_name, session.username),
                    None => (String::new(), String::new()),
                };
                let name = prompt_with_default(&mut rl, "Name", &default_name)?;
                let number = prompt_with_default(&mut rl, "Number", &default_number)?;
                let schedule = prompt(&mut rl, "Schedule & timing")?;
                match tutoring.submit_tutor_offer(&name, &number, &schedule).await {
                    Ok(()) => println!("{}", "Tutor details submitted!".bright_green()),
                    Err(err) => show_error(format!("Failed to submit offer: {err}")),
                }
            }
            "/topics" => match tutoring.browse_topics().await {
                Ok(requests) if requests.is_empty() => {
                    println!("{}", "No topics have been requested yet.".bright_black())
                }
                Ok(requests) => {
                    for (idx, request) in requests.iter().enumerate() {
                        println!(
                            "{} {} {}",
                            format!("{}.", idx + 1).bold(),
                            request.topic,
                            format!("(file: {})", request.file_name).bright_black()
                        );
                    }
                }
                Err(err) => show_error(format!("Could not load topic list: {err}")),
            },
            "/propose" => {
                let topics = match tutoring.browse_topics().await {
                    Ok(topics) => topics,
                    Err(err) => {
                        show_error(format!("Could not load topic list: {err}"));
                        continue;
                    }
                };
                if topics.is_empty() {
                    println!("{}", "No topics have been requested yet.".bright_black());
                    continue;
                }
                for (idx, request) in topics.iter().enumerate() {
                    println!("{} {}", format!("{}.", idx + 1).bold(), request.topic);
                }
                let choice = prompt(&mut rl, "Topic number")?;
                let Some(request) = choice
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|n| topics.get(n))
                else {
                    show_error("Not a valid topic number.");
                    continue;
                };
                let date = prompt(&mut rl, "Date (YYYY-MM-DD)")?;
                let time = prompt(&mut rl, "Time (HH:MM)")?;
                match tutoring
                    .propose_session(&request.requested_by_username, &request.topic, &date, &time)
                    .await
                {
                    Ok(()) => println!(
                        "{}",
                        format!(
                            "Offer to tutor for '{}' sent! Waiting for student approval.",
                            request.topic
                        )
                        .bright_green()
                    ),
                    Err(err) => show_error(format!("Failed to send offer: {err}")),
                }
            }
            "/profile" => match tutoring.profile().await {
                Ok(profile) => {
                    println!("{} {}", "Name:".bold(), profile.display_name);
                    println!("{} {}", "Username:".bold(), profile.username);
                    println!("{} {}", "Tutor points:".bold(), profile.tutor_points);
                    if profile.learn_requests.is_empty() {
                        println!("{}", "No courses requested yet.".bright_black());
                    } else {
                        println!("{}", "Your learning requests:".bold());
                        for (idx, request) in profile.learn_requests.iter().enumerate() {
                            println!(
                                "  {}. {} - {}",
                                idx + 1,
                                request.topic,
                                request.file_name
                            );
                        }
                    }
                }
                Err(err) => show_error(format!("Could not load profile: {err}")),
            },
            "/yes" | "/no" => {
                let decision = if trimmed == "/yes" {
                    ProposalDecision::Accepted
                } else {
                    ProposalDecision::Rejected
                };
                match notifier.resolve_dialog(decision).await {
                    Ok(Some(proposal)) => println!(
                        "{}",
                        format!("Offer for '{}' {}.", proposal.topic, decision).bright_green()
                    ),
                    Ok(None) => {
                        println!("{}", "There is no pending tutoring offer.".bright_black())
                    }
                    Err(err) => show_error(format!("Could not deliver your answer: {err}")),
                }
            }
            "/dismiss" => match notifier.dismiss_dialog() {
                Some(proposal) => println!(
                    "{}",
                    format!("Dismissed the offer for '{}'.", proposal.topic).bright_black()
                ),
                None => println!("{}", "There is no pending tutoring offer.".bright_black()),
            },
            "/push" => {
                let Some(username) = sessions.username().await else {
                    show_error("Not logged in.");
                    continue;
                };
                match PushSubscription::open(&api, &username).await {
                    Ok(mut subscription) => {
                        // Push replaces the poll loop
                        if let Some(handle) = poll_handle.take() {
                            handle.stop().await;
                        }
                        if let Some(task) = push_task.take() {
                            task.abort();
                        }
                        let push_notifier = Arc::clone(&notifier);
                        push_task = Some(tokio::spawn(async move {
                            while let Some(notification) = subscription.recv().await {
                                push_notifier.dispatch(notification).await;
                            }
                            println!("{}", "Push channel closed.".yellow());
                        }));
                        println!("{}", "Switched to push notifications.".bright_green());
                    }
                    Err(err) => show_error(format!("Could not open push channel: {err}")),
                }
            }
            "/stats" => {
                let stats = notifier.stats();
                println!(
                    "cycles: {}  successes: {}  failures: {}  skipped (no session): {}  skipped (in flight): {}",
                    stats.cycles,
                    stats.successes,
                    stats.failures,
                    stats.skipped_no_session,
                    stats.skipped_in_flight
                );
            }
            "/logout" => {
                if let Some(handle) = poll_handle.take() {
                    handle.stop().await;
                }
                if let Some(task) = push_task.take() {
                    task.abort();
                }
                if let Err(err) = auth.logout().await {
                    show_error(err);
                }
                logged_in = false;
                println!("{}", "Logged out.".bright_green());
                print_help(false);
            }
            "/help" => print_help(true),
            _ => println!("{}", "Unknown command".bright_black()),
        }
    }

    // Shut down background work before exiting
    if let Some(handle) = poll_handle.take() {
        handle.stop().await;
    }
    if let Some(task) = push_task.take() {
        task.abort();
    }
    display_handler.abort();

    Ok(())
}
