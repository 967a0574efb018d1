//! Command-line driver for the storage service client.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use clap::{Args, Parser, Subcommand};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use dedup_client::domain::ports::UploadListener;
use dedup_client::domain::{
    AppRoute, FileFilters, FileId, FileSummary, LoginCredentials, ResponseBody, RouteDecision,
    SignupDetails, UploadSource, UploadStatus, UploadedFile, describe_details_failure,
    format_bytes,
};
use dedup_client::{ClientServices, ClientSettings};

/// `dedup-client` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dedup-client",
    about = "Upload and browse files on a deduplicating storage service",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Register an account using the configured password, then sign in.
    Signup {
        /// Account name.
        username: String,
        /// Contact email.
        #[arg(long)]
        email: Option<String>,
    },
    /// End the current session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Upload one or more files, one at a time.
    Upload {
        /// Files to upload.
        #[arg(required = true, value_name = "path")]
        paths: Vec<PathBuf>,
    },
    /// List your files.
    Files(FilterArgs),
    /// List every file with storage figures (administrators only).
    AdminFiles(FilterArgs),
    /// List public files.
    PublicFiles,
    /// Show details for one file.
    Details {
        /// File identifier.
        id: FileId,
    },
    /// Print the download URL for a file.
    DownloadUrl {
        /// File identifier.
        id: FileId,
    },
    /// Flip a file between public and private.
    TogglePrivacy {
        /// File identifier.
        id: FileId,
    },
    /// Delete a file.
    Delete {
        /// File identifier.
        id: FileId,
    },
    /// Grant administrator rights.
    Promote {
        /// Account to promote.
        username: String,
    },
    /// Revoke administrator rights.
    Demote {
        /// Account to demote.
        username: String,
    },
}

#[derive(Debug, Clone, Default, Args)]
struct FilterArgs {
    /// Filename substring.
    #[arg(long)]
    search: Option<String>,
    /// MIME type.
    #[arg(long = "mime-type")]
    mime_type: Option<String>,
    /// Minimum size in KB.
    #[arg(long = "min-size")]
    min_size: Option<String>,
    /// Maximum size in KB.
    #[arg(long = "max-size")]
    max_size: Option<String>,
    /// Earliest upload date.
    #[arg(long = "start-date")]
    start_date: Option<String>,
    /// Latest upload date.
    #[arg(long = "end-date")]
    end_date: Option<String>,
    /// Uploader username substring.
    #[arg(long)]
    uploader: Option<String>,
}

impl From<FilterArgs> for FileFilters {
    fn from(args: FilterArgs) -> Self {
        Self {
            search: args.search,
            mime_type: args.mime_type,
            min_size: args.min_size,
            max_size: args.max_size,
            start_date: args.start_date,
            end_date: args.end_date,
            uploader: args.uploader,
        }
    }
}

struct PrintingListener;

impl UploadListener for PrintingListener {
    fn file_uploaded(&self, file: &UploadedFile) {
        match &file.hash {
            Some(hash) => println!("stored {} hash={hash}", file.filename),
            None => println!("stored {}", file.filename),
        }
    }
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    let args = CliArgs::parse();
    runtime.block_on(async_main(args))
}

async fn async_main(args: CliArgs) -> io::Result<()> {
    let settings = ClientSettings::load_from_iter([OsString::from("dedup-client")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let services = ClientServices::build(&settings, Arc::new(PrintingListener))
        .map_err(io::Error::other)?;

    services.session.start().await;
    let outcome = match args.command {
        Command::Signup { username, email } => {
            signup(&services, &settings, &username, email.as_deref()).await
        }
        command => match sign_in_if_needed(&services, &settings).await {
            Ok(()) => run(command, &services).await,
            Err(error) => Err(error),
        },
    };
    if let Some(alert) = services.notifications.current() {
        eprintln!("alert: {}", alert.message());
    }
    services.shutdown();
    outcome
}

async fn sign_in_if_needed(services: &ClientServices, settings: &ClientSettings) -> io::Result<()> {
    if services.session.state().is_authenticated() {
        return Ok(());
    }
    let Some((username, password)) = settings.credentials() else {
        return Ok(());
    };
    let credentials = LoginCredentials::try_from_parts(username, password).map_err(|error| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("invalid credentials: {error}"))
    })?;
    services
        .session
        .login(&credentials)
        .await
        .map_err(|error| io::Error::other(format!("login failed: {error}")))
}

async fn signup(
    services: &ClientServices,
    settings: &ClientSettings,
    username: &str,
    email: Option<&str>,
) -> io::Result<()> {
    let password = settings.password.as_deref().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "signup needs a password; set DEDUP_CLIENT_PASSWORD",
        )
    })?;
    let details = SignupDetails::try_from_parts(username, email, password).map_err(|error| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("invalid signup details: {error}"))
    })?;
    services
        .session
        .signup(&details)
        .await
        .map_err(|error| io::Error::other(format!("signup failed: {error}")))?;
    match services.session.current_session() {
        Some(session) => println!("signed up as {}", session.username),
        None => println!("signed up; no session was established"),
    }
    Ok(())
}

fn require(services: &ClientServices, route: AppRoute) -> io::Result<()> {
    match route.decide(&services.session.state()) {
        RouteDecision::Allow => Ok(()),
        RouteDecision::Pending => Err(io::Error::other("session is still loading")),
        RouteDecision::Redirect(target) => Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("not permitted; redirected to {target}"),
        )),
    }
}

async fn run(command: Command, services: &ClientServices) -> io::Result<()> {
    match command {
        Command::Signup { .. } => Err(io::Error::other("signup runs before sign-in")),
        Command::Logout => {
            services.session.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            match services.session.current_session() {
                Some(session) => println!(
                    "id={} username={} email={} role={}",
                    session.id,
                    session.username,
                    session.email.as_deref().unwrap_or("-"),
                    session.role
                ),
                None => println!("not signed in"),
            }
            Ok(())
        }
        Command::Upload { paths } => {
            require(services, AppRoute::Home)?;
            upload(services, &paths).await
        }
        Command::Files(filters) => {
            require(services, AppRoute::Home)?;
            let listing = services
                .catalogue
                .list_files(&filters.into())
                .await
                .map_err(io::Error::other)?;
            print_summaries(&listing.files);
            Ok(())
        }
        Command::AdminFiles(filters) => {
            require(services, AppRoute::Admin)?;
            let listing = services
                .catalogue
                .list_admin_files(&filters.into())
                .await
                .map_err(io::Error::other)?;
            print_summaries(&listing.files);
            println!(
                "original={} stored={} saved={} ({:.1}%)",
                format_bytes(listing.stats.original_size),
                format_bytes(listing.stats.dedup_size),
                format_bytes(listing.stats.save_size),
                listing.stats.saved_percent()
            );
            Ok(())
        }
        Command::PublicFiles => {
            let listing = services
                .catalogue
                .list_public_files()
                .await
                .map_err(io::Error::other)?;
            for file in &listing.files {
                println!(
                    "{}\t{}\t{}\t{}\tdownloads={}",
                    file.id,
                    file.filename,
                    format_bytes(file.size),
                    file.uploader,
                    file.download_count
                );
            }
            println!("total={}", listing.total);
            Ok(())
        }
        Command::Details { id } => {
            require(services, AppRoute::FileDetails(id))?;
            let details = services
                .catalogue
                .file_details(id)
                .await
                .map_err(|error| io::Error::other(describe_details_failure(&error)))?;
            println!("id={}", details.id);
            println!("filename={}", details.filename);
            println!("uploader={}", details.uploader_username);
            println!("size={}", format_bytes(details.size));
            println!("uploaded_at={}", details.uploaded_at.to_rfc3339());
            println!("public={}", details.is_public);
            println!("downloads={}", details.download_count);
            Ok(())
        }
        Command::DownloadUrl { id } => {
            let url = services
                .catalogue
                .download_url(id)
                .map_err(io::Error::other)?;
            println!("{url}");
            Ok(())
        }
        Command::TogglePrivacy { id } => {
            require(services, AppRoute::Home)?;
            let body = services
                .catalogue
                .toggle_privacy(id)
                .await
                .map_err(io::Error::other)?;
            print_body(body);
            Ok(())
        }
        Command::Delete { id } => {
            require(services, AppRoute::Home)?;
            let body = services
                .catalogue
                .delete_file(id)
                .await
                .map_err(io::Error::other)?;
            print_body(body);
            Ok(())
        }
        Command::Promote { username } => {
            require(services, AppRoute::RoleManagement)?;
            let body = services
                .roles
                .make_admin(&username)
                .await
                .map_err(io::Error::other)?;
            print_body(body);
            Ok(())
        }
        Command::Demote { username } => {
            require(services, AppRoute::RoleManagement)?;
            let body = services
                .roles
                .make_user(&username)
                .await
                .map_err(io::Error::other)?;
            print_body(body);
            Ok(())
        }
    }
}

async fn upload(services: &ClientServices, paths: &[PathBuf]) -> io::Result<()> {
    let sources = paths
        .iter()
        .map(PathBuf::as_path)
        .map(read_source)
        .collect::<io::Result<Vec<_>>>()?;
    services.uploads.intake(sources);
    let report = services.uploads.upload_pending().await;

    for item in services.uploads.items() {
        match (item.status(), item.error_message()) {
            (UploadStatus::Error, Some(message)) => {
                println!("{}\terror\t{message}", item.source().file_name());
            }
            (status, _) => println!("{}\t{status}", item.source().file_name()),
        }
    }
    println!("uploaded={} failed={}", report.uploaded, report.failed);
    if let Some(abort) = report.aborted {
        return Err(io::Error::other(format!("upload stopped: {}", abort.message)));
    }
    Ok(())
}

/// Directory holding `path`; bare file names resolve against the working
/// directory.
fn upload_parent(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn read_source(path: &Path) -> io::Result<UploadSource> {
    let parent = upload_parent(path);
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "upload path must be a file"))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|error| {
        io::Error::other(format!(
            "open upload parent directory '{}': {error}",
            parent.display()
        ))
    })?;
    let mut file = directory.open(Path::new(file_name)).map_err(|error| {
        io::Error::other(format!("open upload file '{}': {error}", path.display()))
    })?;
    let mut content = Vec::new();
    file.read_to_end(&mut content).map_err(|error| {
        io::Error::other(format!("read upload file '{}': {error}", path.display()))
    })?;
    Ok(UploadSource::from_bytes(
        file_name.to_string_lossy().into_owned(),
        content,
    ))
}

fn print_summaries(files: &[FileSummary]) {
    for file in files {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            file.id,
            file.filename,
            format_bytes(file.size),
            file.uploaded_at.to_rfc3339(),
            if file.is_public { "public" } else { "private" },
            file.uploader.as_deref().unwrap_or("-")
        );
    }
}

fn print_body(body: ResponseBody) {
    match body {
        ResponseBody::Empty => println!("ok"),
        ResponseBody::Text(text) => println!("{text}"),
        ResponseBody::Json(value) => println!("{value}"),
    }
}
