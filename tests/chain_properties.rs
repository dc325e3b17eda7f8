//! Property tests for size-class rounding and chain stream semantics.

use netbuf::{BufferPool, InputBuffer, OutputBuffer, PoolConfig, SizeClass, SIZE_CLASSES};
use proptest::prelude::*;
use std::sync::Arc;

fn create_pool() -> Arc<BufferPool> {
    Arc::new(BufferPool::new(PoolConfig::default()))
}

#[derive(Debug, Clone)]
enum Op {
    Append(Vec<u8>),
    Pop(usize),
    Flush(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..6000).prop_map(Op::Append),
        (0usize..8000).prop_map(Op::Pop),
        (1usize..5000).prop_map(Op::Flush),
    ]
}

/// Sink accepting at most `limit` bytes per call.
struct Limited {
    out: Vec<u8>,
    limit: usize,
}

impl std::io::Write for Limited {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.limit);
        self.out.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

proptest! {
    #[test]
    fn prop_allocate_picks_smallest_fitting_class(size in 0usize..=9 * 1024 * 1024) {
        let pool = BufferPool::new(PoolConfig::default());
        match pool.allocate(size) {
            Ok(node) => {
                let cap = node.capacity();
                prop_assert!(cap >= size);
                prop_assert!(SIZE_CLASSES.contains(&cap));
                prop_assert!(SIZE_CLASSES.iter().filter(|&&c| c < cap).all(|&c| c < size));
                pool.release(node);
            }
            Err(_) => prop_assert!(size > SizeClass::LARGEST.capacity()),
        }
    }

    #[test]
    fn prop_output_stream_matches_model(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let pool = create_pool();
        let mut output = OutputBuffer::new(Arc::clone(&pool));
        let mut model: Vec<u8> = Vec::new();
        let mut flushed: Vec<u8> = Vec::new();

        for op in ops {
            match op {
                Op::Append(bytes) => {
                    prop_assert_eq!(output.append(&bytes).unwrap(), bytes.len());
                    model.extend_from_slice(&bytes);
                }
                Op::Pop(n) => {
                    if n <= model.len() {
                        output.pop(n).unwrap();
                        model.drain(..n);
                    } else {
                        prop_assert!(output.pop(n).is_err());
                    }
                }
                Op::Flush(limit) => {
                    let mut sink = Limited { out: Vec::new(), limit };
                    let n = output.flush_to(&mut sink).unwrap();
                    prop_assert_eq!(&sink.out[..], &model[..n]);
                    flushed.extend(model.drain(..n));
                }
            }
            prop_assert_eq!(output.len(), model.len());
            prop_assert_eq!(output.to_vec(), model.clone());
        }

        drop(output);
        for class in SizeClass::all() {
            prop_assert_eq!(pool.created_count(class), pool.free_count(class));
        }
    }

    #[test]
    fn prop_input_reads_preserve_order(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..3000), 1..20),
        pops in prop::collection::vec(0usize..2000, 0..20),
    ) {
        let pool = create_pool();
        let mut input = InputBuffer::new(Arc::clone(&pool));
        let mut model: Vec<u8> = Vec::new();
        let mut pops = pops.into_iter();

        for chunk in &chunks {
            let mut src = &chunk[..];
            while !src.is_empty() {
                let n = input.read_from(&mut src).unwrap();
                model.extend_from_slice(&chunk[chunk.len() - src.len() - n..chunk.len() - src.len()]);
            }
            if let Some(p) = pops.next() {
                let p = p.min(model.len());
                input.pop(p).unwrap();
                model.drain(..p);
                input.adjust();
            }
            prop_assert_eq!(input.len(), model.len());
        }
        prop_assert_eq!(input.to_vec(), model);
    }

    #[test]
    fn prop_adjust_is_idempotent(data in prop::collection::vec(any::<u8>(), 1..4096), skip in 0usize..4096) {
        let pool = create_pool();
        let mut input = InputBuffer::new(pool);
        input.read_from(&mut &data[..]).unwrap();
        let skip = skip.min(data.len());
        input.pop(skip).unwrap();

        input.adjust();
        let once = input.to_vec();
        let len = input.len();
        input.adjust();

        prop_assert_eq!(input.to_vec(), once);
        prop_assert_eq!(input.len(), len);
        prop_assert_eq!(input.to_vec(), data[skip..].to_vec());
    }
}
