use std::{
    io::{self, Write},
    path::Path,
};

use anyhow::anyhow;
use blockfat::{
    cli_interface::{AddArgs, BlockFatCli, FileArgs},
    mount::with_image,
};
use clap::Parser;

/// a CLI interface to users to create our filesystem,
/// or to mount an image and run one file operation against it.
///
/// Every operation mounts the image, runs, then unmounts it again.
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = BlockFatCli::parse();
    match args {
        BlockFatCli::Mkfs(args) => {
            blockfat::mkfs::mkfs(args.image_file_path, args.data_blocks)?;
        }
        BlockFatCli::Info(args) => {
            let info = with_image(args.image_file_path, |fs| Ok(fs.info()?))?;
            print!("{info}");
        }
        BlockFatCli::Ls(args) => {
            let listing = with_image(args.image_file_path, |fs| Ok(fs.list()?))?;
            println!("FS Ls:");
            for file in listing {
                println!("{file}");
            }
        }
        BlockFatCli::Add(args) => add(args)?,
        BlockFatCli::Rm(FileArgs {
            image_file_path,
            name,
        }) => {
            with_image(image_file_path, |fs| Ok(fs.delete(&name)?))?;
            println!("Removed file '{name}'");
        }
        BlockFatCli::Cat(FileArgs {
            image_file_path,
            name,
        }) => {
            let (content, size) = with_image(image_file_path, |fs| {
                let fd = fs.open(&name)?;
                let size = fs.stat(fd)?;
                let mut buf = vec![0u8; size];
                let read = fs.read(fd, &mut buf);
                fs.close(fd)?;
                buf.truncate(read?);
                Ok((buf, size))
            })?;
            println!("Read file '{name}' ({}/{size} bytes)", content.len());
            println!("Content of the file:");
            io::stdout().write_all(&content)?;
        }
        BlockFatCli::Stat(FileArgs {
            image_file_path,
            name,
        }) => {
            let size = with_image(image_file_path, |fs| {
                let fd = fs.open(&name)?;
                let size = fs.stat(fd);
                fs.close(fd)?;
                Ok(size?)
            })?;
            println!("Size of file '{name}' is {size} bytes");
        }
    }
    Ok(())
}

/// copy a host file into the image, under the host file's name
fn add(args: AddArgs) -> anyhow::Result<()> {
    let host_path = Path::new(&args.file);
    let name = host_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("{} has no usable file name", host_path.display()))?
        .to_owned();
    let data = std::fs::read(host_path)?;

    let written = with_image(&args.image_file_path, |fs| {
        fs.create(&name)?;
        let fd = fs.open(&name)?;
        let written = fs.write(fd, &data);
        fs.close(fd)?;
        Ok(written?)
    })?;
    println!("Wrote file '{name}' ({written}/{} bytes)", data.len());
    Ok(())
}
