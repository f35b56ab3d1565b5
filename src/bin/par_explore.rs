//! Scans a PAR2 file and prints a one-line summary of every packet found.

use anyhow::{Context, Result};
use clap::{Arg, Command};
use par2rs::packets::{Packet, Scanner};
use std::fs::File;
use std::io::BufReader;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = Command::new("par-explore")
        .about("Dumps the packet contents of a PAR2 file")
        .arg(Arg::new("par").long("par").required(true).help("Path to a .par2 file"))
        .get_matches();

    let path = matches.get_one::<String>("par").expect("par is required by clap");
    let file = File::open(path).with_context(|| format!("could not open {path}"))?;

    let scanner = Scanner::new(BufReader::new(file), path);
    let mut count = 0usize;
    for packet in scanner {
        count += 1;
        match packet {
            Ok(Packet::Main(main)) => {
                println!(
                    "[{count}] Main: slice_size={} recovery_files={} non_recovery_files={}",
                    main.slice_size,
                    main.recovery_file_ids.len(),
                    main.non_recovery_file_ids.len()
                );
            }
            Ok(Packet::FileDescription(fd)) => {
                println!("[{count}] FileDescription: name={} length={}", fd.file_name, fd.file_length);
            }
            Ok(Packet::FileSliceChecksum(fsc)) => {
                println!("[{count}] FileSliceChecksum: slices={}", fsc.slices.len());
            }
            Ok(Packet::RecoverySlice(rs)) => {
                println!("[{count}] RecoverySlice: exponent={} bytes={}", rs.exponent, rs.data_len);
            }
            Ok(Packet::Creator(creator)) => {
                println!("[{count}] Creator: {}", creator.text);
            }
            Ok(Packet::Unknown(type_of_packet)) => {
                println!("[{count}] Unknown: type={}", String::from_utf8_lossy(&type_of_packet));
            }
            Err(e) => {
                eprintln!("[{count}] error: {e}");
            }
        }
    }

    Ok(())
}
