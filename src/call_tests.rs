use crate::error::ZError;
use crate::test_utils::{headless, StoryBuilder};
use test_log::test;

#[test]
fn test_call_passes_args_over_defaults() {
    let story = StoryBuilder::new()
        // call 0x1000 #5 -> sp; print_num sp; quit
        .code(&[0xE0, 0x1F, 0x10, 0x00, 0x05, 0x00, 0xE6, 0xBF, 0x00, 0xBA])
        // add L01 L02 -> sp; ret_popped
        .routine(0x2000, &[7, 8], &[0x74, 0x01, 0x02, 0x00, 0xB8])
        .build();
    let (mut interp, io) = headless(story, &[]);
    interp.run().unwrap();
    assert_eq!(io.output(), "13");
}

#[test]
fn test_call_zero_stores_false() {
    let story = StoryBuilder::new()
        .global(0, 99)
        // call 0 -> g00; print_num g00; quit
        .code(&[0xE0, 0x3F, 0x00, 0x00, 0x10, 0xE6, 0xBF, 0x10, 0xBA])
        .build();
    let (mut interp, io) = headless(story, &[]);
    interp.run().unwrap();
    assert_eq!(io.output(), "0");
    assert_eq!(interp.vm.call_stack.depth(), 1);
}

#[test]
fn test_nested_calls_store_into_caller_local() {
    let story = StoryBuilder::new()
        .code(&[0xE0, 0x3F, 0x10, 0x00, 0x00, 0xE6, 0xBF, 0x00, 0xBA])
        // call 0x1080 -> L01; ret L01
        .routine(0x2000, &[0], &[0xE0, 0x3F, 0x10, 0x80, 0x01, 0xAB, 0x01])
        // ret #42
        .routine(0x2100, &[], &[0x9B, 0x2A])
        .build();
    let (mut interp, io) = headless(story, &[]);
    interp.run().unwrap();
    assert_eq!(io.output(), "42");
}

#[test]
fn test_each_frame_has_its_own_stack() {
    let story = StoryBuilder::new()
        // push #1; call 0x1000 -> sp; add sp sp -> sp; print_num sp; quit
        .code(&[
            0xE8, 0x7F, 0x01, 0xE0, 0x3F, 0x10, 0x00, 0x00, 0x74, 0x00, 0x00, 0x00, 0xE6, 0xBF,
            0x00, 0xBA,
        ])
        // push #20; pop; rtrue
        .routine(0x2000, &[], &[0xE8, 0x7F, 0x14, 0xB9, 0xB0])
        .build();
    let (mut interp, io) = headless(story, &[]);
    interp.run().unwrap();
    assert_eq!(io.output(), "2");
}

#[test]
fn test_return_from_main_is_an_error() {
    let (mut interp, _) = headless(StoryBuilder::new().code(&[0xB0]).build(), &[]);
    assert_eq!(interp.run(), Err(ZError::ReturnFromMainRoutine));
    assert!(interp.is_halted());
}

#[test]
fn test_too_many_locals() {
    let story = StoryBuilder::new()
        .code(&[0xE0, 0x3F, 0x10, 0x00, 0x00, 0xBA])
        .bytes_at(0x2000, &[16])
        .build();
    let (mut interp, _) = headless(story, &[]);
    assert_eq!(
        interp.run(),
        Err(ZError::TooManyLocals {
            address: 0x2000,
            count: 16
        })
    );
}

#[test]
fn test_push_pull_pop() {
    let story = StoryBuilder::new()
        // push #7; push #9; pull g00; pop; print_num g00; quit
        .code(&[
            0xE8, 0x7F, 0x07, 0xE8, 0x7F, 0x09, 0xE9, 0x7F, 0x10, 0xB9, 0xE6, 0xBF, 0x10, 0xBA,
        ])
        .build();
    let (mut interp, io) = headless(story, &[]);
    interp.run().unwrap();
    assert_eq!(io.output(), "9");
    assert_eq!(interp.vm.call_stack.current().stack_depth(), 0);
}

#[test]
fn test_pop_on_empty_stack_underflows() {
    let (mut interp, _) = headless(StoryBuilder::new().code(&[0xB9]).build(), &[]);
    assert!(matches!(interp.run(), Err(ZError::StackUnderflow(_))));
}

#[test]
fn test_store_to_stack_pushes_and_load_peeks() {
    let story = StoryBuilder::new()
        // push #3; store sp #8; load sp -> g00; print_num sp; print_num g00;
        // print_num sp; quit
        .code(&[
            0xE8, 0x7F, 0x03, 0x0D, 0x00, 0x08, 0x9E, 0x00, 0x10, 0xE6, 0xBF, 0x00, 0xE6, 0xBF,
            0x10, 0xE6, 0xBF, 0x00, 0xBA,
        ])
        .build();
    let (mut interp, io) = headless(story, &[]);
    interp.run().unwrap();
    assert_eq!(io.output(), "883");
}

#[test]
fn test_store_to_empty_stack_pushes() {
    // store sp #7; print_num sp; quit
    let story = StoryBuilder::new()
        .code(&[0x0D, 0x00, 0x07, 0xE6, 0xBF, 0x00, 0xBA])
        .build();
    let (mut interp, io) = headless(story, &[]);
    interp.run().unwrap();
    assert_eq!(io.output(), "7");
    assert_eq!(interp.vm.call_stack.current().stack_depth(), 0);
}

#[test]
fn test_store_to_stack_keeps_the_old_top() {
    // push #1; store sp #7; print_num sp; print_num sp; quit
    let story = StoryBuilder::new()
        .code(&[0xE8, 0x7F, 0x01, 0x0D, 0x00, 0x07, 0xE6, 0xBF, 0x00, 0xE6, 0xBF, 0x00, 0xBA])
        .build();
    let (mut interp, io) = headless(story, &[]);
    interp.run().unwrap();
    assert_eq!(io.output(), "71");
}

#[test]
fn test_pull_into_stack_and_dec_in_place() {
    let story = StoryBuilder::new()
        // push #4; push #9; pull sp; dec sp; print_num sp; print_num sp; quit
        .code(&[
            0xE8, 0x7F, 0x04, 0xE8, 0x7F, 0x09, 0xE9, 0x7F, 0x00, 0x96, 0x00, 0xE6, 0xBF, 0x00,
            0xE6, 0xBF, 0x00, 0xBA,
        ])
        .build();
    let (mut interp, io) = headless(story, &[]);
    interp.run().unwrap();
    assert_eq!(io.output(), "84");
    assert_eq!(interp.vm.call_stack.current().stack_depth(), 0);
}
