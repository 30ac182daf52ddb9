use physlab::{BoundaryEvent, Engine, model_catalog};
use std::env;
use std::process::ExitCode;

const FRAME: f64 = 1.0 / 60.0;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let model_id = args.next().unwrap_or_else(|| "projectile".to_string());
    let seconds: f64 = match args.next().map(|s| s.parse()) {
        None => 5.0,
        Some(Ok(s)) => s,
        Some(Err(e)) => {
            eprintln!("invalid duration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut engine = match Engine::new_builtin(&model_id) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("available models:");
            for info in model_catalog() {
                eprintln!("  {:<14} {}", info.id, info.name);
            }
            return ExitCode::FAILURE;
        }
    };

    // Simulated 60 Hz frame loop
    let frames = (seconds / FRAME).round() as usize;
    let mut events = 0usize;
    for i in 0..=frames {
        match engine.frame(i as f64 * FRAME) {
            Ok(Some(report)) => {
                for event in &report.events {
                    if !matches!(event, BoundaryEvent::Decayed { .. } | BoundaryEvent::Faded { .. }) {
                        println!("t = {:.3} s  {:?}", report.time, event);
                    }
                }
                events += report.events.len();
            }
            Ok(None) => {}
            Err(e) => {
                eprintln!("step failed: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    println!("model = {} ({} integration)", engine.model_id(), engine.mode());
    println!("t = {:.3} s, {} events", engine.time(), events);
    let state = engine.current_state();
    for (name, field) in &state.fields {
        match field.as_scalar() {
            Some(v) => println!("  {} = {:.4}", name, v),
            None => match field.as_vector() {
                Some(v) => println!("  {} = [{:.4}, {:.4}, {:.4}]", name, v[0], v[1], v[2]),
                None => println!("  {} = <{} values>", name, field_len(field)),
            },
        }
    }
    let samples = engine.sample_series();
    println!("samples = {}", samples.len());
    if let Some(last) = samples.last() {
        println!("last sample (t, value) = ({:.3}, {:.4})", last.time, last.value);
    }
    ExitCode::SUCCESS
}

fn field_len(field: &physlab::Field) -> usize {
    use physlab::Field;
    match field {
        Field::Scalar(_) | Field::Vector(_) => 1,
        Field::Series(v) => v.len(),
        Field::Vectors(v) => v.len(),
        Field::Points(v) => v.len(),
        Field::Flags(v) => v.len(),
    }
}
