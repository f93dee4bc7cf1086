use log::{debug, info};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_rnn_cell::cells::{ParamKind, RecurrentCell};
use rust_rnn_cell::config::{load_config, CellConfig};
use rust_rnn_cell::error::CellError;
use rust_rnn_cell::optimizers::Optimizer;
use std::error::Error;
use std::process;
use std::time::Instant;

// Running-sum task: hidden unit 0 learns to track the cumulative sum of a
// scalar input sequence.
const INPUT_SIZE: usize = 1;
const HIDDEN_SIZE: usize = 8;
const SEQUENCE_LENGTH: usize = 12;
// Training hyperparameters.
const LEARNING_RATE: f64 = 0.01;
const EPOCHS: usize = 300;
const CELL_SEED: u64 = 42;
const DATA_SEED: u64 = 1234;
const LOG_EVERY: usize = 50;

/// Build the cell configuration from the command line.
///
/// With no argument the built-in hyperparameters are used; otherwise the first
/// argument is read as a JSON [`CellConfig`]. The task feeds scalar samples,
/// so the configuration must have `input_size` 1.
fn config_from_args(args: &[String]) -> Result<CellConfig, Box<dyn Error>> {
    let config = match args.get(1) {
        Some(path) => load_config(path)?,
        None => {
            let mut config = CellConfig::new(INPUT_SIZE);
            config.hidden_size = HIDDEN_SIZE;
            config.learning_rate = LEARNING_RATE;
            config.seed = Some(CELL_SEED);
            config
        }
    };

    if config.input_size != INPUT_SIZE {
        return Err(format!(
            "running-sum task needs input_size {}, config has {}",
            INPUT_SIZE, config.input_size
        )
        .into());
    }
    Ok(config)
}

/// Random sequence of `length` samples in [0, 0.5) and its running sums.
fn generate_sequence(rng: &mut StdRng, length: usize) -> (Array2<f64>, Vec<f64>) {
    let mut data = Array2::zeros((length, INPUT_SIZE));
    let mut targets = Vec::with_capacity(length);
    let mut sum = 0.0;
    for t in 0..length {
        let x: f64 = rng.gen_range(0.0..0.5);
        sum += x;
        data[[t, 0]] = x;
        targets.push(sum);
    }
    (data, targets)
}

/// Mean squared error of hidden unit 0 against `targets` and the per-step
/// gradients with respect to the full hidden state.
fn readout_loss(outputs: &Array2<f64>, targets: &[f64]) -> (f64, Vec<Array2<f64>>) {
    let steps = targets.len() as f64;
    let hidden_size = outputs.ncols();
    let mut loss = 0.0;
    let mut grads = Vec::with_capacity(targets.len());

    for (t, &target) in targets.iter().enumerate() {
        let error = outputs[[t, 0]] - target;
        loss += 0.5 * error * error / steps;

        let mut grad = Array2::zeros((hidden_size, 1));
        grad[[0, 0]] = error / steps;
        grads.push(grad);
    }
    (loss, grads)
}

/// Train `cell` for `epochs` sequences, one forward/backward/update per
/// sequence. Returns the loss of the last epoch.
fn train(
    cell: &mut RecurrentCell,
    optimizer: &mut dyn Optimizer,
    clip_threshold: f64,
    epochs: usize,
    rng: &mut StdRng,
) -> Result<f64, CellError> {
    let mut last_loss = f64::NAN;

    for epoch in 0..epochs {
        let (data, targets) = generate_sequence(rng, SEQUENCE_LENGTH);

        cell.clear_stored_states();
        let trace = cell.forward_propagate(data.view())?;
        let (loss, grads) = readout_loss(&trace.outputs(), &targets);
        cell.backward_propagate(trace, &grads)?;

        cell.clip_gradients_to(clip_threshold);
        cell.update_weights_with(&mut *optimizer)?;

        if (epoch + 1) % LOG_EVERY == 0 {
            info!("Epoch {}, Loss: {:.6}", epoch + 1, loss);
        }
        debug!("epoch {} loss {:.6}", epoch + 1, loss);
        last_loss = loss;
    }

    Ok(last_loss)
}

/// Make the input projection non-negative so the readout unit starts alive.
///
/// A readout unit whose input weight is negative stays clamped at zero for
/// non-negative inputs and never receives a gradient.
fn prepare_cell(cell: &mut RecurrentCell) {
    for param in cell.parameters_mut() {
        if param.kind == ParamKind::InputToHiddenWeight {
            param.weight.mapv_inplace(f64::abs);
        }
    }
}

fn run(args: &[String]) -> Result<f64, Box<dyn Error>> {
    let config = config_from_args(args)?;

    info!(
        "Initializing cell: input_size={}, hidden_size={}",
        config.input_size, config.hidden_size
    );
    let mut cell = config.build_cell()?;
    prepare_cell(&mut cell);
    let mut optimizer = config.build_optimizer();
    let mut rng = StdRng::seed_from_u64(DATA_SEED);

    println!("Training {} on running sums...", cell);
    let start = Instant::now();
    let loss = train(
        &mut cell,
        optimizer.as_mut(),
        config.clip_threshold,
        EPOCHS,
        &mut rng,
    )?;
    let train_time = start.elapsed().as_secs_f64();

    let (data, targets) = generate_sequence(&mut rng, SEQUENCE_LENGTH);
    cell.clear_stored_states();
    let outputs = cell.forward_propagate(data.view())?.outputs();
    println!("\nTesting the trained cell:");
    for (t, target) in targets.iter().enumerate() {
        println!(
            "step {:2}: input {:.3} -> predicted {:.3}, expected {:.3}",
            t,
            data[[t, 0]],
            outputs[[t, 0]],
            target
        );
    }

    println!("\n=== Summary ===");
    println!("Final training loss: {:.6}", loss);
    println!("Training time: {:.2} seconds", train_time);
    Ok(loss)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
