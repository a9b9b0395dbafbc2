use anyhow::{Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::{ArgValueCompleter, CompletionCandidate};
use iocraft::prelude::*;
use std::{
    future::Future,
    io::{self, IsTerminal, Write},
    path::PathBuf,
};
use url::Url;

use threef::{
    bundle::{ArchiveNaming, archive_folder_name, download_bundle},
    client::TransferClient,
    config::{self, Config},
    direct::{download_direct, share_images},
    history::{self, History, HistoryEntry},
    model::RemoteFile,
    platform::TerminalPlatform,
    selection::Selection,
    submission::{LinkStyle, UploadSession},
    ui::{
        BusyIndicator, CatalogList, ConfigHeader, ErrorMessage, HistoryList, InputPrompt,
        ShareLinkPanel, SuccessMessage, UploadList, WarningMessage,
    },
};

#[derive(Parser)]
#[command(name = "threef")]
#[command(version)]
#[command(about = "Send files and get a link, or fetch a sent set back")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DownArgs {
    /// Transfer id
    #[arg(add = ArgValueCompleter::new(transfer_id_completer))]
    id: String,
    /// Toggle the file at this position (as listed by `threef ls`); defaults to all files
    #[arg(short, long = "select", value_delimiter = ',')]
    select: Vec<usize>,
    /// Save each file on its own instead of one zip archive
    #[arg(long)]
    direct: bool,
    /// Directory to save into
    #[arg(short, long, value_hint = ValueHint::DirPath, default_value = ".")]
    out: PathBuf,
    /// Number of files fetched at once while building the archive
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=16))]
    jobs: u16,
    /// Name the archive after the first file instead of the transfer id
    #[arg(long)]
    name_from_first: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send files and print a share link
    Up {
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,
        /// Skip reading previews of text files
        #[arg(long)]
        no_preview: bool,
        /// Copy the share link to the clipboard
        #[arg(short, long)]
        copy: bool,
        /// Print the link in the `{origin}/{id}` form
        #[arg(long)]
        legacy_link: bool,
    },
    /// List the files of a transfer
    Ls {
        #[arg(add = ArgValueCompleter::new(transfer_id_completer))]
        id: String,
    },
    /// Download the files of a transfer
    Down(DownArgs),
    /// Share the images of a transfer
    Share {
        #[arg(add = ArgValueCompleter::new(transfer_id_completer))]
        id: String,
    },
    /// Show transfers sent from this machine
    History,
    /// Configure threef interactively
    Config,
}

fn main() -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _rt_guard = rt.enter();
    clap_complete::CompleteEnv::with_factory(Cli::command).complete();
    let cli = Cli::parse();
    threef::init_tracing();

    rt.block_on(async {
        match cli.command {
            Commands::Config => interactive_config(),
            Commands::History => list_history(),
            requires_endpoints => {
                let config = config::read_config()?;
                let client = TransferClient::new(config.api_transfer.clone(), config.api.clone())?
                    .with_file_base(config.public_origin.clone());

                match requires_endpoints {
                    Commands::Up {
                        files,
                        no_preview,
                        copy,
                        legacy_link,
                    } => {
                        let style = if legacy_link {
                            LinkStyle::Legacy
                        } else {
                            LinkStyle::Download
                        };
                        send_files(&client, &config, files, !no_preview, copy, style).await
                    }
                    Commands::Ls { id } => list_files(&client, &id).await,
                    Commands::Down(args) => download_files(&client, args).await,
                    Commands::Share { id } => share_transfer(&client, &id).await,
                    Commands::Config | Commands::History => {
                        unreachable!("handled before reading the configuration")
                    }
                }
            }
        }
    })
}

/// Runs `operation` while an indeterminate spinner is drawn on an interactive terminal.
async fn with_busy_indicator<F: Future>(title: &str, message: &str, operation: F) -> F::Output {
    if !io::stdout().is_terminal() {
        return operation.await;
    }

    let mut indicator = element!(BusyIndicator(
        title: title.to_string(),
        message: message.to_string()
    ));
    tokio::pin!(operation);

    tokio::select! {
        output = &mut operation => output,
        _ = indicator.render_loop() => operation.await,
    }
}

async fn send_files(
    client: &TransferClient,
    config: &Config,
    files: Vec<PathBuf>,
    preview: bool,
    copy: bool,
    style: LinkStyle,
) -> Result<()> {
    let mut session = UploadSession::new();
    session.collector.add_paths(&files, preview).await?;

    element!(UploadList(
        items: session.collector.items().to_vec(),
        total_size: session.collector.total_size(),
        error: session.collector.error().map(|e| e.to_string())
    ))
    .print();

    if !session.collector.can_submit() {
        bail!("Nothing was sent");
    }

    let file_count = session.collector.len();
    let total_size = session.collector.total_size();

    let link = with_busy_indicator(
        "Uploading",
        "Sending your files...",
        session.submit(
            client,
            config.identity.as_ref(),
            &config.public_origin,
            style,
        ),
    )
    .await?
    .clone();

    history::record(HistoryEntry::new(
        &link.id,
        link.url.as_str(),
        file_count,
        total_size,
    ));

    if copy {
        session.copy_link(&TerminalPlatform::new("."));
    }

    element!(ShareLinkPanel(url: link.url.to_string(), copied: session.is_copied())).print();

    Ok(())
}

async fn list_files(client: &TransferClient, id: &str) -> Result<()> {
    let files = client.fetch_catalog(id).await?;

    if files.is_empty() {
        element!(WarningMessage(message: format!("Transfer {} has no files", id))).print();
    } else {
        element!(CatalogList(files: files, selected: Vec::new())).print();
    }

    Ok(())
}

async fn download_files(client: &TransferClient, args: DownArgs) -> Result<()> {
    let files = client.fetch_catalog(&args.id).await?;

    let mut selection = Selection::new(&files);
    for index in &args.select {
        selection.toggle_index(&files, *index)?;
    }

    let chosen: Vec<&RemoteFile> = if args.select.is_empty() {
        files.iter().collect()
    } else {
        selection.selected(&files)
    };

    if chosen.is_empty() {
        bail!("No files to download");
    }

    if !args.select.is_empty() {
        element!(CatalogList(
            files: files.clone(),
            selected: chosen.iter().map(|f| f.id.clone()).collect::<Vec<_>>()
        ))
        .print();
    }

    let platform = TerminalPlatform::new(&args.out);

    if args.direct {
        let report = download_direct(client, &platform, &chosen).await;
        for path in &report.saved {
            println!("{}", path.display());
        }
        if !report.failed.is_empty() {
            element!(WarningMessage(
                message: format!("Could not download: {}", report.failed.join(", "))
            ))
            .print();
        }
        return Ok(());
    }

    let naming = if args.name_from_first {
        ArchiveNaming::FirstFile
    } else {
        ArchiveNaming::SessionId
    };
    let folder = archive_folder_name(naming, &args.id, &chosen);

    let bundle = with_busy_indicator(
        "Downloading Files",
        "Please wait while your files are being prepared...",
        download_bundle(client, &platform, &chosen, &folder, args.jobs as usize),
    )
    .await?;

    match bundle {
        Some(report) => {
            element!(SuccessMessage(
                message: format!("Saved {} file(s) to {}", report.entries.len(), report.path.display())
            ))
            .print();
            if !report.skipped.is_empty() {
                element!(WarningMessage(
                    message: format!("Skipped: {}", report.skipped.join(", "))
                ))
                .print();
            }
        }
        None => {
            element!(WarningMessage(message: "None of the files could be downloaded".to_string()))
                .print();
        }
    }

    Ok(())
}

async fn share_transfer(client: &TransferClient, id: &str) -> Result<()> {
    let files = client.fetch_catalog(id).await?;
    let platform = TerminalPlatform::new(".");

    let shared = share_images(client, &platform, &files).await;
    if shared == 0 {
        element!(WarningMessage(message: "No images were shared".to_string())).print();
    } else {
        element!(SuccessMessage(message: format!("Shared {} image(s)", shared))).print();
    }

    Ok(())
}

fn list_history() -> Result<()> {
    let history = History::load(&history::history_path()?)?;

    if history.entries().is_empty() {
        println!("No transfers sent yet");
    } else {
        element!(HistoryList(entries: history.entries().to_vec())).print();
    }

    Ok(())
}

fn transfer_id_completer(current: &std::ffi::OsStr) -> Vec<CompletionCandidate> {
    let Some(current) = current.to_str() else {
        return vec![];
    };

    let Ok(history) = history::history_path().and_then(|path| History::load(&path)) else {
        return vec![];
    };

    history
        .entries()
        .iter()
        .rev()
        .filter(|entry| entry.id.starts_with(current))
        .map(|entry| CompletionCandidate::new(entry.id.clone()).help(Some(entry.link.clone().into())))
        .collect()
}

fn read_input(prompt: &str, default: Option<&str>, description: Option<&str>) -> Result<String> {
    element! {
        InputPrompt(
            prompt: prompt.to_string(),
            default: default.map(|s| s.to_string()),
            description: description.map(|s| s.to_string())
        )
    }
    .print();

    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_string();

    match (input.is_empty(), default) {
        (true, Some(default)) => Ok(default.to_string()),
        _ => Ok(input),
    }
}

fn read_url(prompt: &str, default: Option<&Url>, description: &str) -> Result<Option<Url>> {
    let default = default.map(|url| url.to_string());

    loop {
        let input = read_input(prompt, default.as_deref(), Some(description))?;
        if input.is_empty() {
            return Ok(None);
        }

        match Url::parse(&input) {
            Ok(url) => return Ok(Some(url)),
            Err(e) => {
                element!(ErrorMessage(message: format!("Invalid URL: {}", e))).print();
                println!();
            }
        }
    }
}

fn read_optional(prompt: &str, default: Option<&str>, description: &str) -> Result<Option<String>> {
    let input = read_input(prompt, default, Some(description))?;
    Ok((!input.is_empty()).then_some(input))
}

fn interactive_config() -> Result<()> {
    element!(ConfigHeader()).print();

    let current = config::read_config_file()?;

    let api = loop {
        match read_url(
            "File list URL",
            current.api.as_ref(),
            "Base URL files are listed from, as GET <url>/<id> (API)",
        )? {
            Some(url) => break url,
            None => {
                element!(ErrorMessage(message: "The file list URL is required".to_string()))
                    .print();
                println!();
            }
        }
    };

    let api_transfer = loop {
        match read_url(
            "Upload URL",
            current.api_transfer.as_ref(),
            "Endpoint files are posted to (API_TRANSFER)",
        )? {
            Some(url) => break url,
            None => {
                element!(ErrorMessage(message: "The upload URL is required".to_string())).print();
                println!();
            }
        }
    };

    let public_origin = read_url(
        "Public origin",
        current.public_origin.as_ref(),
        "Optional: origin share links point to, defaults to the file list URL's origin",
    )?;

    let creator_id = read_optional(
        "Creator id",
        current.creator_id.as_deref(),
        "Optional: attached to uploads as creatorId",
    )?;
    let creator_name = match &creator_id {
        Some(_) => read_optional(
            "Creator name",
            current.creator_name.as_deref(),
            "Optional: attached to uploads as creatorName",
        )?,
        None => None,
    };

    let path = config::write_config(&config::ConfigFile {
        api: Some(api),
        api_transfer: Some(api_transfer),
        public_origin,
        creator_id,
        creator_name,
    })?;

    element!(SuccessMessage(message: format!("Configuration saved to {}", path.display()))).print();

    Ok(())
}
