use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use homeserver_dav::{
    models::Depth,
    services::webdav::{WebDavClient, WebDavClientConfig, DEFAULT_CONTENT_TYPE, MOUNT_PREFIX},
};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("homeserver_dav=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let matches = cli().get_matches();
    let client = WebDavClient::new(client_config(&matches)?)?;

    match matches.subcommand() {
        Some(("ls", sub)) => {
            let path = required(sub, "path")?;
            let depth: Depth = required(sub, "depth")?.parse().map_err(|e: String| anyhow!(e))?;
            let listing = client.list_directory(path, depth).await?;

            if sub.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for entry in &listing.entries {
                    let size = entry
                        .content_length
                        .map(|len| len.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("{:>10}  {}", size, entry.path);
                }
            }
        }
        Some(("cat", sub)) => {
            print!("{}", client.read_file(required(sub, "path")?).await?);
        }
        Some(("put", sub)) => {
            let path = required(sub, "path")?;
            let content = tokio::fs::read_to_string(required(sub, "file")?).await?;
            let content_type = required(sub, "content-type")?;
            client.write_file_with_type(path, content, content_type).await?;
        }
        Some(("rm", sub)) => client.delete_entry(required(sub, "path")?).await?,
        Some(("mkdir", sub)) => client.create_directory(required(sub, "path")?).await?,
        Some(("mv", sub)) => {
            client
                .move_entry(required(sub, "source")?, required(sub, "destination")?)
                .await?
        }
        Some(("cp", sub)) => {
            client
                .copy_entry(required(sub, "source")?, required(sub, "destination")?)
                .await?
        }
        _ => return Err(anyhow!("no subcommand given; see --help")),
    }

    Ok(())
}

fn cli() -> Command {
    let path = || Arg::new("path").help("Path below the WebDAV mount").required(true);
    let relocation = |name: &'static str, about: &'static str| {
        Command::new(name)
            .about(about)
            .arg(Arg::new("source").required(true).index(1))
            .arg(Arg::new("destination").required(true).index(2))
    };

    Command::new("davctl")
        .about("Browse and edit a homeserver's WebDAV tree")
        .subcommand_required(true)
        .arg(
            Arg::new("url")
                .help("Homeserver base URL (defaults to HOMESERVER_WEBDAV_URL)")
                .long("url")
                .global(true),
        )
        .arg(
            Arg::new("token")
                .help("Admin token (defaults to HOMESERVER_ADMIN_TOKEN)")
                .long("token")
                .global(true),
        )
        .arg(
            Arg::new("via-proxy")
                .help("Dashboard proxy URL, e.g. http://localhost:8000/api/webdav; no token needed")
                .long("via-proxy")
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .help("Request timeout in seconds")
                .long("timeout")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .subcommand(
            Command::new("ls")
                .about("List a directory")
                .arg(path().default_value("/").required(false))
                .arg(Arg::new("depth").long("depth").default_value("1"))
                .arg(Arg::new("json").long("json").action(ArgAction::SetTrue)),
        )
        .subcommand(Command::new("cat").about("Print a file").arg(path()))
        .subcommand(
            Command::new("put")
                .about("Upload a local file")
                .arg(path())
                .arg(Arg::new("file").help("Local file to upload").required(true))
                .arg(
                    Arg::new("content-type")
                        .long("content-type")
                        .default_value(DEFAULT_CONTENT_TYPE),
                ),
        )
        .subcommand(Command::new("rm").about("Delete a file or directory").arg(path()))
        .subcommand(Command::new("mkdir").about("Create a directory").arg(path()))
        .subcommand(relocation("mv", "Move a file or directory"))
        .subcommand(relocation("cp", "Copy a file or directory"))
}

fn client_config(matches: &ArgMatches) -> Result<WebDavClientConfig> {
    let timeout = matches.get_one::<u64>("timeout").copied();
    let url = matches
        .get_one::<String>("url")
        .cloned()
        .or_else(|| std::env::var("HOMESERVER_WEBDAV_URL").ok());

    if let Some(proxy) = matches.get_one::<String>("via-proxy") {
        let mut config = WebDavClientConfig::via_proxy(proxy).with_timeout(timeout);
        // MOVE/COPY destinations must name the upstream, not the proxy
        config.destination_base = url.map(|u| format!("{}{}", u.trim_end_matches('/'), MOUNT_PREFIX));
        return Ok(config);
    }

    let url = url.ok_or_else(|| anyhow!("--url or HOMESERVER_WEBDAV_URL is required"))?;
    let token = matches
        .get_one::<String>("token")
        .cloned()
        .or_else(|| std::env::var("HOMESERVER_ADMIN_TOKEN").ok())
        .ok_or_else(|| anyhow!("--token or HOMESERVER_ADMIN_TOKEN is required"))?;

    Ok(WebDavClientConfig::for_homeserver(&url, &token).with_timeout(timeout))
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument <{}>", name))
}
