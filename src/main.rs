use std::path::PathBuf;
use std::process::exit;

use adbeam::utils::utils::{default_key_dir, split_endpoint};
use adbeam::{extract_icon, AdbSession};

const EXIT_FAILURE: i32 = 1;
const KEY_FLAG: &str = "-k";

fn print_usage() {
    println!("Usage: adbeam <command> [options]");
    println!("\nCommands:");
    println!("  install <host[:port]> <apk>       Push an APK and install it");
    println!("  shell <host[:port]> <command...>  Run a shell command on the device");
    println!("  icon <apk> <output>               Extract the launcher icon from an APK");
    println!("\nOptions:");
    println!("  -k <path>      Key file or directory (default: ~/.android)");
    println!("\nExamples:");
    println!("  adbeam install 192.168.1.20 app.apk");
    println!("  adbeam shell 192.168.1.20:5555 pm list packages");
    println!("  adbeam icon app.apk icon.png");
}

fn key_path(args: &[String]) -> PathBuf {
    if let Some(index) = args.iter().position(|arg| arg == KEY_FLAG) {
        if let Some(path) = args.get(index + 1) {
            return PathBuf::from(path);
        }
        eprintln!("Missing value for {}", KEY_FLAG);
        exit(EXIT_FAILURE);
    }

    match default_key_dir() {
        Ok(path) => path,
        Err(err) => {
            eprintln!("Cannot determine key directory: {}", err);
            exit(EXIT_FAILURE);
        }
    }
}

/// Positional arguments, with the key flag and its value stripped.
fn positional(args: &[String]) -> Vec<&String> {
    let mut positional = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
        } else if arg == KEY_FLAG {
            skip = true;
        } else {
            positional.push(arg);
        }
    }
    positional
}

async fn connect(endpoint: &str, keys: &PathBuf) -> AdbSession {
    let (host, port) = match split_endpoint(endpoint) {
        Ok(parts) => parts,
        Err(err) => {
            eprintln!("{}: {}", err, endpoint);
            exit(EXIT_FAILURE);
        }
    };

    println!("Connecting to {}:{}...", host, port);
    match AdbSession::connect(&host, port, keys).await {
        Ok(session) => session,
        Err(err) => {
            eprintln!("Connection failed: {}", err);
            exit(EXIT_FAILURE);
        }
    }
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() {
        print_usage();
        exit(EXIT_FAILURE);
    }

    if let Err(err) = adbeam::logging::init() {
        eprintln!("Failed to initialize logging: {}", err);
        exit(EXIT_FAILURE);
    }

    let keys = key_path(&args[1..]);
    let rest = positional(&args[1..]);

    match args[0].as_str() {
        "install" => {
            let (endpoint, apk) = match (rest.first(), rest.get(1)) {
                (Some(endpoint), Some(apk)) => (endpoint.as_str(), PathBuf::from(apk.as_str())),
                _ => {
                    print_usage();
                    exit(EXIT_FAILURE);
                }
            };

            let mut session = connect(endpoint, &keys).await;
            let report = |message: &str| println!("{}", message);
            if let Err(err) = session.install_apk(&apk, &report).await {
                eprintln!("Install failed: {}", err);
                exit(EXIT_FAILURE);
            }
            session.close().await;
        }
        "shell" => {
            if rest.len() < 2 {
                print_usage();
                exit(EXIT_FAILURE);
            }
            let command = rest[1..]
                .iter()
                .map(|part| part.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            let mut session = connect(rest[0], &keys).await;
            match session.run_shell(&command).await {
                Ok(output) => print!("{}", output),
                Err(err) => {
                    eprintln!("Shell command failed: {}", err);
                    exit(EXIT_FAILURE);
                }
            }
            session.close().await;
        }
        "icon" => {
            let (apk, output) = match (rest.first(), rest.get(1)) {
                (Some(apk), Some(output)) => {
                    (PathBuf::from(apk.as_str()), PathBuf::from(output.as_str()))
                }
                _ => {
                    print_usage();
                    exit(EXIT_FAILURE);
                }
            };

            match extract_icon(&apk) {
                Some(bytes) => {
                    if let Err(err) = std::fs::write(&output, bytes) {
                        eprintln!("Cannot write {}: {}", output.display(), err);
                        exit(EXIT_FAILURE);
                    }
                    println!("Icon written to {}", output.display());
                }
                None => {
                    eprintln!("No launcher icon found in {}", apk.display());
                    exit(EXIT_FAILURE);
                }
            }
        }
        other => {
            println!("Unknown command: {}", other);
            print_usage();
            exit(EXIT_FAILURE);
        }
    }
}
