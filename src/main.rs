use std::process::exit;

fn main() {
    apigen::init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            exit(1);
        }
    };

    let code = runtime.block_on(apigen::run_cli(std::env::args().collect()));
    exit(code);
}
