use clap::Parser;
use credvault::cli::{commands, output, Cli, Commands};
use credvault::config::AppConfig;

fn main() {
    let cli = Cli::parse();

    // Logging needs the config's level; a broken config is reported by
    // the command itself.
    let log_level = AppConfig::load(&cli.data_dir)
        .map(|c| c.log_level)
        .unwrap_or_else(|_| "warn".to_string());
    credvault::logging::init(&log_level);

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Signup => commands::signup::execute(&cli),
        Commands::Add {
            ref service,
            ref username,
            generate,
            length,
        } => commands::add::execute(&cli, service, username, generate, length),
        Commands::Get {
            ref service,
            ref username,
        } => commands::get::execute(&cli, service, username.as_deref()),
        Commands::List => commands::list::execute(&cli),
        Commands::Delete {
            ref service,
            ref username,
            force,
        } => commands::delete::execute(&cli, service, username, force),
        Commands::Export {
            plaintext,
            encrypt_file,
            passphrase,
            ref output,
        } => commands::export::execute(&cli, plaintext, encrypt_file, passphrase, output.clone()),
        Commands::Import {
            ref file,
            passphrase,
        } => commands::import::execute(&cli, file, passphrase),
        Commands::ResetPassword => commands::reset_password::execute(&cli),
        Commands::Generate { length } => commands::generate::execute(length),
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
