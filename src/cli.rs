use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(washbuddy::config::AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        let code = run_init(args);
        return RunOutcome::Exit(code);
    }

    let database_url = match resolve_database_url(cli.database_url.as_deref()) {
        Ok(url) => url,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };

    RunOutcome::Serve(washbuddy::config::AppConfig {
        addr: cli.addr,
        database_url,
        database_secret: cli.database_secret,
        icon: cli.icon,
        vapid_private_key: cli.vapid_private_key,
        vapid_public_key: cli.vapid_public_key,
        vapid_subject: cli.vapid_subject,
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "washbuddy",
    version,
    about = "Push notifications for shared laundry rooms"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "WASHBUDDY_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,
    #[arg(long, env = "WASHBUDDY_DATABASE_URL")]
    database_url: Option<String>,
    #[arg(long, env = "WASHBUDDY_DATABASE_SECRET")]
    database_secret: Option<String>,
    #[arg(long, env = "WASHBUDDY_ICON", default_value = washbuddy::config::DEFAULT_ICON)]
    icon: String,
    #[arg(long, env = "WASHBUDDY_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "WASHBUDDY_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "WASHBUDDY_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a VAPID key pair.
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match washbuddy::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => ("mailto:you@example.com".to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("WASHBUDDY_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("WASHBUDDY_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("WASHBUDDY_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace WASHBUDDY_VAPID_SUBJECT with a contact URI you control.");
    }
    println!();
    println!("Clients need the public key as their applicationServerKey.");
    0
}

fn resolve_database_url(raw: Option<&str>) -> Result<String, String> {
    let url = raw
        .map(str::trim)
        .ok_or("--database-url is required unless using a subcommand")?;
    if url.is_empty() {
        return Err("database url cannot be empty".to_string());
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(format!(
            "invalid database url '{url}'; expected http:// or https://"
        ));
    }
    Ok(url.trim_end_matches('/').to_string())
}
