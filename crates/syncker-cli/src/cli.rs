use clap::{ArgAction, Args, Parser, Subcommand};

pub const SYNCKER_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nCommands:\n{subcommands}\n\nGlobal options:\n{options}\n";

pub const SYNCKER_BEFORE_HELP: &str = concat!(
    "syncker ",
    env!("CARGO_PKG_VERSION"),
    " - Keep local files in sync with Google Drive\n\n",
    "Drive paths are written gdrive:/Folder/file. Only indexed Drive paths can be\n",
    "linked, synced, backed up or downloaded; run `syncker auth` once first.",
);

#[derive(Parser, Debug)]
#[command(
    name = "syncker",
    author,
    version,
    disable_help_subcommand = true,
    before_help = SYNCKER_BEFORE_HELP,
    help_template = SYNCKER_HELP_TEMPLATE
)]
pub struct SynckerCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(about = "Authorize syncker to access Google Drive and store the user token.")]
    Auth,
    #[command(about = "Show the indexed Drive files and their links.")]
    List(ListArgs),
    #[command(
        about = "Index a Drive file or folder, including every folder above it.",
        override_usage = "syncker index <DRIVE_FILE>"
    )]
    Index(DrivePathArgs),
    #[command(
        about = "Drop a Drive path and everything below it from the index.",
        override_usage = "syncker unindex <DRIVE_FILE>"
    )]
    Unindex(DrivePathArgs),
    #[command(
        about = "Link an indexed Drive file with a local file.",
        override_usage = "syncker link <DRIVE_FILE> <LOCAL_FILE>"
    )]
    Link(LinkArgs),
    #[command(
        about = "Remove the link of a Drive or local file.",
        override_usage = "syncker unlink <FILE>"
    )]
    Unlink(FileArgs),
    #[command(
        about = "Upload a linked local file over its Drive counterpart.",
        override_usage = "syncker sync <FILE>"
    )]
    Sync(FileArgs),
    #[command(
        about = "Copy an indexed Drive file next to itself.",
        override_usage = "syncker backup <DRIVE_FILE> [-n NAME]"
    )]
    Backup(BackupArgs),
    #[command(
        about = "Download an indexed Drive file; never overwrites.",
        override_usage = "syncker download <DRIVE_FILE> [-o TO]"
    )]
    Download(DownloadArgs),
    #[command(
        about = "Overwrite an indexed Drive file with any local file.",
        override_usage = "syncker update <DRIVE_FILE> <LOCAL_FILE>"
    )]
    Update(LinkArgs),
    #[command(
        about = "Upload a local file into an indexed Drive folder, then index and link it.",
        override_usage = "syncker upload <LOCAL_FILE> <DRIVE_FOLDER> [-n NAME] [-x]"
    )]
    Upload(UploadArgs),
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    #[arg(short = 'l', long = "no-tree", help = "Print full Drive paths instead of a tree")]
    pub flat: bool,
    #[arg(short = 'u', long, help = "Hide the local files linked to each Drive file")]
    pub hide_links: bool,
}

#[derive(Args, Debug)]
pub struct DrivePathArgs {
    #[arg(value_name = "DRIVE_FILE", help = "Drive path, e.g. gdrive:/Reports/Q1.pdf")]
    pub drive_file: String,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    #[arg(value_name = "FILE", help = "A linked Drive path or local file")]
    pub file: String,
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    #[arg(value_name = "DRIVE_FILE")]
    pub drive_file: String,
    #[arg(value_name = "LOCAL_FILE")]
    pub local_file: String,
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    #[arg(value_name = "DRIVE_FILE")]
    pub drive_file: String,
    #[arg(
        short = 'n',
        long,
        value_name = "NAME",
        help = "Name of the copy (default BACKUP-<timestamp>-<name>)"
    )]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    #[arg(value_name = "DRIVE_FILE")]
    pub drive_file: String,
    #[arg(
        short = 'o',
        long,
        value_name = "TO",
        help = "Destination path (default: the Drive name in the current directory)"
    )]
    pub to: Option<String>,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    #[arg(value_name = "LOCAL_FILE")]
    pub local_file: String,
    #[arg(value_name = "DRIVE_FOLDER")]
    pub drive_folder: String,
    #[arg(short = 'n', long, value_name = "NAME", help = "Name on Drive (default: the local name)")]
    pub name: Option<String>,
    #[arg(short = 'x', long, help = "Upload without indexing or linking the new file")]
    pub no_index: bool,
}
