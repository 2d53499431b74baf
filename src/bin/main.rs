//! This is the main entry point for the FAT32 navigator.
//!
//! The program opens a FAT32 volume image read-only and provides an interactive command-line
//! interface to inspect it: print its information (INFO), list the current directory (DIR),
//! change directory (CD) and extract a file into the working directory (GET).
//!
//! Usage: `main <fat32_image> [-v...]`

use fat32_nav::commands::Command;
use fat32_nav::filesystem::dir_entry::is_valid_display_name;
use fat32_nav::traits::LayoutDisplay;
use fat32_nav::{DirEntry, FATError, FATVol};
use log::{error, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::{env, process};

/// Represents the runtime state of the program.
///
/// This struct keeps track of the opened image, its volume and the current directory.
struct RunState {
    /// The opened volume image.
    image: File,
    /// The FAT32 volume of the image.
    vol: FATVol,
    /// First cluster of the current directory.
    cwd: u32,
    /// Names of the directories leading to the current directory.
    path: Vec<String>,
}

fn main() {
    let mut image_path = None;
    let mut verbosity = 1;
    for arg in env::args().skip(1) {
        if arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v') {
            verbosity += arg.len() - 1;
        } else if image_path.is_none() {
            image_path = Some(arg);
        } else {
            usage();
        }
    }
    let Some(image_path) = image_path else { usage() };

    stderrlog::new()
        .module(module_path!())
        .module("fat32_nav")
        .verbosity(verbosity)
        .init()
        .unwrap();

    let mut image = match File::open(&image_path) {
        Ok(file) => file,
        Err(err) => {
            error!("Can't open {image_path}: {err}");
            process::exit(1);
        }
    };
    let vol = match FATVol::open(&mut image) {
        Ok(vol) => vol,
        Err(err) => {
            error!("{image_path} is not a usable FAT32 volume: {err}");
            process::exit(1);
        }
    };

    let mut run_state = RunState {
        image,
        cwd: vol.root_cluster(),
        vol,
        path: vec![],
    };

    loop {
        print!("/{}> ", run_state.path.join("/"));
        io::stdout().flush().unwrap();

        let mut s = String::new();
        match io::stdin().read_line(&mut s) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                error!("Failed to read command: {err}");
                break;
            }
        }

        match Command::from_string(&s) {
            Command::Quit => break,
            Command::Info => print_info(&run_state),
            Command::Dir => {
                if let Err(err) = print_dir(&mut run_state) {
                    error!("Listing failed: {err}");
                }
            }
            Command::Cd(target) => change_dir(&mut run_state, &target),
            Command::Get(name) => {
                if let Err(err) = download(&mut run_state, &name) {
                    error!("Download of {name} failed: {err}");
                }
            }
            Command::Unknown(s) => error!("Unknown command: {s:?}"),
            Command::Invalid(s) => error!("{s}"),
            Command::Empty => {}
        }
    }

    println!("\nExited...");
}

fn usage() -> ! {
    eprintln!("Usage: main <fat32_image> [-v...]");
    process::exit(1);
}

fn print_info(run_state: &RunState) {
    println!("{}", run_state.vol);
    match run_state.vol.display_layout(0) {
        Ok(layout) => println!("{layout}"),
        Err(err) => error!("Layout printing failed: {err}"),
    }
}

fn print_dir(run_state: &mut RunState) -> Result<(), FATError> {
    let vol = &run_state.vol;

    println!("DIRECTORY LISTING");
    let label = vol.volume_label(&mut run_state.image)?;
    println!("VOL_ID: {}", label.as_deref().unwrap_or("NO NAME"));

    for entry in vol.list_entries(&mut run_state.image, run_state.cwd) {
        let entry = entry?;
        if entry.is_volume_id() || entry.is_long_name() {
            continue;
        }

        let name = entry.name_str();
        if !is_valid_display_name(&name) {
            warn!("Skipping entry with an unprintable name: {:?}", entry.name());
            continue;
        }

        if entry.is_dir() {
            println!("<{}>\t\t{}", name, entry.file_size());
        } else {
            println!("{}\t\t{}", name, entry.file_size());
        }
    }

    match vol.free_space_bytes() {
        Some(free) => println!("----Bytes Free: {free}"),
        None => println!("----Bytes Free: unknown"),
    }
    println!("----DONE");

    Ok(())
}

fn change_dir(run_state: &mut RunState, target: &str) {
    match run_state
        .vol
        .resolve_path(&mut run_state.image, run_state.cwd, target)
    {
        Ok(cluster) => {
            if target.starts_with('/') {
                run_state.path.clear();
            }
            for component in target.split('/').filter(|c| !c.is_empty()) {
                match component {
                    "." => {}
                    ".." => {
                        run_state.path.pop();
                    }
                    name => run_state.path.push(name.to_string()),
                }
            }
            run_state.cwd = cluster;
        }
        Err(FATError::NotFound(_)) => println!("Error: folder not found"),
        Err(err) => error!("cd {target} failed: {err}"),
    }
}

fn download(run_state: &mut RunState, name: &str) -> Result<(), FATError> {
    let entry = match run_state
        .vol
        .find_file(&mut run_state.image, run_state.cwd, name)
    {
        Ok(entry) => entry,
        Err(FATError::NotFound(_)) => {
            println!("Error: file not found");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let Some(out_name) = output_name(&entry) else {
        println!("Error: {:?} cannot be used as a local file name", entry.name());
        return Ok(());
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o644);
    let mut out = BufWriter::new(options.open(&out_name)?);

    let res = run_state
        .vol
        .extract_file(
            &mut run_state.image,
            entry.cluster_number(),
            *entry.file_size(),
            &mut out,
        )
        .and_then(|_| out.flush().map_err(FATError::from));
    if let Err(err) = res {
        drop(out);
        if let Err(rm_err) = fs::remove_file(&out_name) {
            warn!("Can't remove the partial file {out_name}: {rm_err}");
        }
        return Err(err);
    }

    println!("Done.");
    Ok(())
}

/// Name of the local file receiving `entry`.
///
/// # Returns
/// - `None` if the name is unprintable, is `.` or `..`, or holds a path separator.
fn output_name(entry: &DirEntry) -> Option<String> {
    let name = entry.name_str();
    if name.is_empty()
        || name == "."
        || name == ".."
        || !is_valid_display_name(&name)
        || name.contains(['/', '\\'])
    {
        return None;
    }
    Some(name)
}
