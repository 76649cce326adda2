use anyhow::Result;
use clap::Parser;
use log::info;

use issue_pilot::generator::TaskGenerator;
use issue_pilot::github::GitHubClient;
use issue_pilot::parser::IssueParser;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository as owner/repo or a GitHub URL
    #[arg(short, long)]
    repo: String,

    /// GitHub API token (falls back to GITHUB_TOKEN, then the config file)
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List open issues, optionally filtered by label
    Issues {
        /// Only show issues carrying one of these labels (comma separated)
        #[arg(short, long)]
        labels: Option<String>,
    },
    /// Build the agent task for one issue and print it as JSON
    Task {
        /// Issue number
        number: u64,

        /// Skip fetching issue comments
        #[arg(long)]
        no_comments: bool,
    },
    /// Show the current API rate limit status
    RateLimit,
    /// Show the authenticated user
    Whoami,
}

/// Accept either `owner/repo` or a full repository URL
fn resolve_repo(repo: &str) -> Result<(String, String)> {
    if let Some((owner, name)) = repo.split_once('/') {
        if !owner.contains(':') && !name.contains('/') && !repo.contains("://") {
            return Ok((owner.to_string(), name.to_string()));
        }
    }
    Ok(GitHubClient::parse_repo_url(repo)?)
}

fn main() -> Result<()> {
    // Log level is controlled by RUST_LOG, e.g. RUST_LOG=debug
    env_logger::init();

    let cli = Cli::parse();
    let (owner, repo) = resolve_repo(&cli.repo)?;

    let mut client = GitHubClient::new(cli.token.as_deref(), None, None)?;

    match cli.command {
        Command::Issues { labels } => {
            let issues = client.list_issues(&owner, &repo, "open", None)?;
            let wanted: Option<Vec<String>> = labels
                .map(|l| l.split(',').map(|s| s.trim().to_string()).collect());

            for issue in issues {
                if let Some(wanted) = &wanted {
                    let has_label = issue
                        .labels
                        .iter()
                        .any(|label| wanted.contains(&label.name));
                    if !has_label {
                        continue;
                    }
                }
                println!("#{}\t{}", issue.number, issue.title);
            }
        }
        Command::Task { number, no_comments } => {
            info!("Fetching issue #{} from {}/{}", number, owner, repo);
            let issue = client.get_issue(&owner, &repo, number)?;
            let comments = if no_comments {
                Vec::new()
            } else {
                client.list_issue_comments(&owner, &repo, number, None)?
            };

            let problem = IssueParser::new().parse(&issue, &comments);
            let task = TaskGenerator::new().generate(&problem, None);
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        Command::RateLimit => {
            let limit = client.get_rate_limit()?;
            println!(
                "{} of {} requests remaining, window resets at epoch {}",
                limit.remaining, limit.limit, limit.reset
            );
        }
        Command::Whoami => {
            let user = client.get_current_user()?;
            println!("{}", user.login);
        }
    }

    Ok(())
}
