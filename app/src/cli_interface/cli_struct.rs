use clap::Parser;

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about)]
pub enum BlockFatCli {
    /// create a new file system image
    Mkfs(MkfsArgs),
    /// show the geometry and free space of a file system
    Info(ImageArgs),
    /// list the files of a file system
    Ls(ImageArgs),
    /// copy a host file into a file system
    Add(AddArgs),
    /// delete a file from a file system
    Rm(FileArgs),
    /// print a file of a file system
    Cat(FileArgs),
    /// print the size of a file of a file system
    Stat(FileArgs),
}

/// make a new fs subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "make a new file system")]
pub struct MkfsArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// the number of data blocks of the file system
    #[clap(short, long)]
    pub data_blocks: usize,
}

/// subcommands that only need an image
#[derive(clap::Args, Debug, PartialEq)]
pub struct ImageArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
}

/// add a host file subcommand
#[derive(clap::Args, Debug, PartialEq)]
pub struct AddArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// the host file to copy, stored under its file name
    #[clap(short, long)]
    pub file: String,
}

/// subcommands working on one file of the image
#[derive(clap::Args, Debug, PartialEq)]
pub struct FileArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// the file name inside the file system
    #[clap(short, long)]
    pub name: String,
}


/// test the file subcommands
#[cfg(test)]
mod file_parse_args_tests {
    use super::*;

    #[test]
    fn test_image_subcommands() {
        let args = BlockFatCli::parse_from(["blockfat", "info", "-p", "disk.img"]);
        assert_eq!(
            args,
            BlockFatCli::Info(ImageArgs {
                image_file_path: "disk.img".to_string(),
            })
        );
        let args = BlockFatCli::parse_from(["blockfat", "ls", "--image-file-path", "disk.img"]);
        assert_eq!(
            args,
            BlockFatCli::Ls(ImageArgs {
                image_file_path: "disk.img".to_string(),
            })
        );
    }

    #[test]
    fn test_add_subcommand() {
        let args = BlockFatCli::parse_from(["blockfat", "add", "-p", "disk.img", "-f", "notes.txt"]);
        assert_eq!(
            args,
            BlockFatCli::Add(AddArgs {
                image_file_path: "disk.img".to_string(),
                file: "notes.txt".to_string(),
            })
        );
    }

    #[test]
    fn test_named_file_subcommands() {
        let expected = FileArgs {
            image_file_path: "disk.img".to_string(),
            name: "a.txt".to_string(),
        };
        let args = BlockFatCli::parse_from(["blockfat", "rm", "-p", "disk.img", "-n", "a.txt"]);
        assert_eq!(args, BlockFatCli::Rm(expected));

        let args = BlockFatCli::parse_from([
            "blockfat",
            "cat",
            "--image-file-path",
            "disk.img",
            "--name",
            "a.txt",
        ]);
        assert!(matches!(args, BlockFatCli::Cat(FileArgs { ref name, .. }) if name == "a.txt"));

        let args = BlockFatCli::parse_from(["blockfat", "stat", "-p", "disk.img", "-n", "a.txt"]);
        assert!(matches!(args, BlockFatCli::Stat(_)));
    }
}
