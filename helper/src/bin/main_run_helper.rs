fn main() -> anyhow::Result<()> {
    bastion_helper::main_run_helper()
}
