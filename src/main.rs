#![allow(dead_code)]

use crate::areas::repository::Repository;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod areas;
mod artifacts;
mod commands;

#[derive(Parser)]
#[command(
    name = "grit",
    version = "0.1.0",
    about = "A minimal git client",
    long_about = "A minimal implementation of git's content-addressed object store \
    together with a smart-HTTP clone client. It is not a replacement for git, \
    but a small tool covering the plumbing needed to create and clone repositories.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "cat-file",
        about = "Print the payload of an object",
        long_about = "This command prints the raw payload of an object in the repository. \
        The object is named by its full hash or by a unique prefix of at least two characters."
    )]
    CatFile {
        #[arg(short = 'p', help = "Pretty-print the object payload")]
        pretty_print: bool,
        #[arg(index = 1, help = "The object hash")]
        object: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file and optionally write it to the object database"
    )]
    HashObject {
        #[arg(
            short,
            long,
            required = false,
            help = "Write the object to the object database"
        )]
        write: bool,
        #[arg(index = 1)]
        file: String,
    },
    #[command(
        name = "ls-tree",
        about = "List the entry names of a tree object, in stored order"
    )]
    LsTree {
        #[arg(index = 1, help = "The tree hash")]
        object: String,
    },
    #[command(
        name = "write-tree",
        about = "Hash the working directory into a tree object",
        long_about = "This command recursively hashes the current directory into blob and tree \
        objects, skipping the .git directory, and prints the root tree hash."
    )]
    WriteTree,
    #[command(name = "commit-tree", about = "Create a commit object")]
    CommitTree {
        #[arg(index = 1, help = "The tree hash the commit snapshots")]
        tree: String,
        #[arg(short = 'p', help = "The parent commit hash")]
        parent: Option<String>,
        #[arg(short = 'm', help = "The commit message")]
        message: String,
    },
    #[command(
        name = "clone",
        about = "Clone a repository served over smart HTTP",
        long_about = "This command clones a remote repository into a new directory: it discovers \
        the remote HEAD, fetches a pack, ingests it into the object database, and checks out \
        the advertised branch."
    )]
    Clone {
        #[arg(index = 1, help = "The remote repository URL")]
        url: String,
        #[arg(index = 2, help = "The target directory")]
        directory: PathBuf,
    },
}

fn main() {
    if let Err(error) = run() {
        eprintln!("fatal: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { path } => {
            let path = match path {
                Some(path) => path.clone(),
                None => std::env::current_dir()?,
            };

            current_repository_at(path)?.init()?
        }
        Commands::CatFile {
            pretty_print,
            object,
        } => {
            anyhow::ensure!(
                *pretty_print,
                "cat-file: only pretty-printed output (-p) is supported"
            );

            current_repository()?.cat_file(object)?
        }
        Commands::HashObject { write, file } => current_repository()?.hash_object(file, *write)?,
        Commands::LsTree { object } => current_repository()?.ls_tree(object)?,
        Commands::WriteTree => current_repository()?.write_tree()?,
        Commands::CommitTree {
            tree,
            parent,
            message,
        } => current_repository()?.commit_tree(tree, parent.as_deref(), message)?,
        Commands::Clone { url, directory } => {
            Repository::clone_from(url, Path::new(directory), Box::new(std::io::stdout()))?
        }
    }

    Ok(())
}

fn current_repository() -> Result<Repository> {
    current_repository_at(std::env::current_dir()?)
}

fn current_repository_at(path: PathBuf) -> Result<Repository> {
    Repository::new(path, Box::new(std::io::stdout()))
}
