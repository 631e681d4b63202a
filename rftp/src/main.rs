use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rftp",
    version,
    about = "Batch FTP client - run a list of file commands against a server",
    long_about = "`rftp` connects to an FTP server, runs the given commands in order and logs out.

EXAMPLE:
    # List a directory, fetch a tree, upload one file
    rftp ftp.example.com anna:s3cret ls get pub/docs put notes.txt --summary

COMMANDS:
    ls                    list the current remote directory
    cd <dir>              change remote directory ('..' ascends one level)
    delete <file>         delete a remote file
    get <path>            fetch a remote file or directory tree
    put <local> [remote]  send a local file (optional remote name) or directory tree
    mkdir <dir>           create a remote directory
    rmdir <dir>           remove a remote directory tree recursively"
)]
struct Args {
    // ARGUMENTS
    /// FTP server host name or address
    #[arg(value_name = "HOST")]
    host: String,

    /// Login credentials in the form user:password
    #[arg(value_name = "USER:PASSWORD")]
    credentials: String,

    /// Commands to run, in order
    #[arg(value_name = "COMMAND", required = true, num_args = 1..)]
    commands: Vec<String>,

    // Connection
    /// Server control port
    #[arg(
        long,
        default_value_t = 21,
        value_name = "PORT",
        help_heading = "Connection"
    )]
    port: u16,

    /// Use active data connections instead of passive
    #[arg(long, help_heading = "Connection")]
    active: bool,

    /// Transfer files in ASCII mode instead of binary
    #[arg(long, help_heading = "Connection")]
    ascii: bool,

    // Progress & output
    /// Print one '#' on stderr per megabyte transferred
    #[arg(long, help_heading = "Progress & output")]
    progress: bool,

    /// Print summary at the end
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,
}

fn run(args: &Args) -> Result<common::dispatch::Summary> {
    let credentials: remote::Credentials = args
        .credentials
        .parse()
        .context("invalid <user:password> argument")?;
    let mut session = remote::FtpSession::connect(&args.host, args.port)
        .context("FTP server refused connection")?;
    println!("connected to {} on {}", args.host, args.port);
    if let Some(welcome) = session.welcome() {
        tracing::info!("server says: {}", welcome.trim_end());
    }
    let local_root = std::env::current_dir().context("cannot determine the working directory")?;
    // everything past this point must still log the session out
    let outcome = (|| -> Result<common::dispatch::Summary> {
        session
            .login(&credentials.user, &credentials.password)
            .context("login failed")?;
        session
            .set_transfer_mode(!args.ascii)
            .context("cannot set the transfer type")?;
        session.set_channel_mode(args.active);
        if args.progress {
            session.observe_transfers(Box::new(common::progress::MarkerProgress::per_megabyte()));
        }
        let summary = common::dispatch::dispatch(&mut session, &local_root, &args.commands)?;
        Ok(summary)
    })();
    session.quit();
    outcome
}

fn main() -> Result<()> {
    let args = Args::parse();
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary,
    };
    common::init_tracing(&output);
    match run(&args) {
        Ok(summary) => {
            if output.print_summary {
                println!("\n{summary}");
            }
            Ok(())
        }
        Err(error) => {
            tracing::error!("{:#}", &error);
            std::process::exit(1);
        }
    }
}
