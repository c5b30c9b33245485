macro_rules! require_args {
    ($op:expr, $args:expr, $expected:expr) => {
        if $args.len() != $expected {
            return Err(RError::InvalidArgumentCount {
                function: $op.to_string(),
                expected: $expected,
                supplied: $args.len(),
            });
        }
    };
}

macro_rules! require_one_arg {
    ($op:expr, $args:expr) => {
        require_args!($op, $args, 1)
    };
}
