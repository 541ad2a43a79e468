/// Usage instructions shown at startup.
use std::io::{self, Write};

pub const INSTRUCTIONS: &str = "\
Instructions:
---> This is a directory traversal log generator.
---> Enter the path of the directory to traverse exactly as you would type it anywhere else.
---> The result file will be generated in the directory you are running this program from.
---> It is emailed to the address you enter, then moved to the trash.";

pub fn print_banner(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{INSTRUCTIONS}")
}
