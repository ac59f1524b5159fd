//! gltf-ext CLI - inspect the extension data of glTF documents
//!
//! Reads a glTF JSON (or YAML) document and lists every field that the core
//! schema does not declare, per host entity.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use gltf_ext::schema::Root;
use gltf_ext::{
    Extensible, ExtensionConfig, Interceptor, JsonBackend, PropertyValue, Registries,
    YamlBackend,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gltf-ext")]
#[command(version, about = "Inspect extension data in glTF documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List unrecognized fields of every host entity
    Inspect {
        /// Path to the glTF document (.gltf/.json, or .yaml/.yml)
        path: PathBuf,

        /// Extension handling configuration (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check that every required extension is supported
    Check {
        /// Path to the glTF document
        path: PathBuf,

        /// Supported extension names
        #[arg(short, long = "supported")]
        supported: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect { path, config } => inspect(&path, config.as_deref()),
        Commands::Check { path, supported } => check(&path, &supported),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<ExtensionConfig, String> {
    match path {
        Some(path) => ExtensionConfig::load_from_file(path).map_err(|e| e.to_string()),
        None => Ok(ExtensionConfig::default()),
    }
}

fn read_root(path: &Path, interceptor: &mut Interceptor<'_>) -> Result<Root, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let root = if is_yaml {
        YamlBackend::parse_str(interceptor, &text)
    } else {
        JsonBackend::parse_str(interceptor, &text)
    };
    root.map_err(|e| e.to_string())
}

fn print_host<H: Extensible>(label: &str, host: &H) {
    let Some(bag) = host.generic_properties() else {
        return;
    };
    for (name, value) in bag.iter() {
        match value {
            PropertyValue::Resolved(v) => println!("{} {}: <{}>", label, name, v.type_name()),
            PropertyValue::Raw(node) => println!("{} {}: {}", label, name, node),
            PropertyValue::Failed { node, error } => {
                println!("{} {}: {} (failed: {})", label, name, node, error)
            }
        }
    }
}

fn inspect(path: &Path, config: Option<&Path>) -> Result<(), String> {
    let config = load_config(config)?;
    let registries = Registries::with_config(&config);
    let mut interceptor = Interceptor::with_config(&registries, &config);
    let root = read_root(path, &mut interceptor)?;

    println!(
        "glTF {} ({} nodes, {} materials)",
        root.asset.version,
        root.nodes.len(),
        root.materials.len()
    );

    print_host("root", &root);
    print_host("asset", &root.asset);
    if let Some(extensions) = &root.extensions {
        print_host("root.extensions", extensions);
    }
    for (i, node) in root.nodes.iter().enumerate() {
        let label = format!("nodes[{}]", i);
        print_host(&label, node);
        if let Some(extensions) = &node.extensions {
            print_host(&format!("{}.extensions", label), extensions);
        }
    }
    for (i, material) in root.materials.iter().enumerate() {
        let label = format!("materials[{}]", i);
        print_host(&label, material);
        if let Some(extensions) = &material.extensions {
            print_host(&format!("{}.extensions", label), extensions);
        }
    }

    let failures = interceptor.failures();
    if !failures.is_empty() {
        println!("{} extension(s) failed to convert", failures.len());
    }
    Ok(())
}

fn check(path: &Path, supported: &[String]) -> Result<(), String> {
    let registries = Registries::new();
    let mut interceptor = Interceptor::new(&registries);
    let root = read_root(path, &mut interceptor)?;

    let supported: Vec<&str> = supported.iter().map(String::as_str).collect();
    let missing = root.unsupported_required_extensions(&supported);
    if missing.is_empty() {
        println!("✓ All required extensions are supported");
        Ok(())
    } else {
        Err(format!("Unsupported required extensions: {}", missing.join(", ")))
    }
}
