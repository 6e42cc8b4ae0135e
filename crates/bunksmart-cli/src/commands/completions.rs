use clap::Command;
use clap_complete::Shell;

pub fn run(shell: Shell, cmd: &mut Command) {
    clap_complete::generate(shell, cmd, "bunksmart", &mut std::io::stdout());
}
