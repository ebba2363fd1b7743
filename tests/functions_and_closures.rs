use itmoscript::run_to_string;

#[test]
fn fibonacci() {
    let output = run_to_string(
        "
          fib = function(n)
              if n == 0 then
                  return 0
              end if

              a = 0
              b = 1

              for i in range(1,n,1) then
                  c = a + b
                  a = b
                  b = c
              end for

              return b
          end function

          print(fib(10))
      ",
    );
    assert_eq!(output, "55");
}

#[test]
fn fizzbuzz() {
    let output = run_to_string(
        "
      fizzBuzz = function(n)
          for i in range(1, n, 1) then
              s = \"Fizz\" * (i % 3 == 0) + \"Buzz\" * (i % 5 == 0)
              if s == \"\" then
                  print(i)
              else
                  print(s)
              end if
          end for
      end function

      fizzBuzz(100)
        ",
    );
    let expected =
        "12Fizz4BuzzFizz78FizzBuzz11Fizz1314FizzBuzz1617Fizz19BuzzFizz2223FizzBuz\
z26Fizz2829FizzBuzz3132Fizz34BuzzFizz3738FizzBuzz41Fizz4344FizzBuzz4647F\
izz49BuzzFizz5253FizzBuzz56Fizz5859FizzBuzz6162Fizz64BuzzFizz6768FizzBuz\
z71Fizz7374FizzBuzz7677Fizz79BuzzFizz8283FizzBuzz86Fizz8889FizzBuzz9192F\
izz94BuzzFizz9798Fizz";
    assert_eq!(output, expected);
}

#[test]
fn maximum_over_a_list() {
    let output = run_to_string(
        "
      max = function(arr)
          if len(arr) == 0 then
              return nil
          end if

          m = arr[0]

          for i in arr then
              if i > m then m = i end if
          end for

          return m
      end function

      print(max([10, -1, 0, 2, 2025, 239]))
      ",
    );
    assert_eq!(output, "2025");
}

#[test]
fn simple_function_call() {
    let output = run_to_string(
        "
        incr = function(value)
            return value + 1
        end function

        x = incr(2)
        print(x)
    ",
    );
    assert_eq!(output, "3");
}

#[test]
fn function_passed_as_an_argument() {
    let output = run_to_string(
        "
        incr = function(value)
            return value + 1
        end function

        printresult = function(value, func)
            result = func(value)
            print(result)
        end function

        printresult(2, incr)
    ",
    );
    assert_eq!(output, "3");
}

#[test]
fn nested_function_definitions_do_not_share_parameter_names() {
    let output = run_to_string(
        "
        incr_and_print = function(value)
            incr = function(value)
                return value + 1
            end function

            print(incr(value))
        end function

        incr_and_print(2)
    ",
    );
    assert_eq!(output, "3");
}

#[test]
fn function_call_results_compose_inside_a_list_literal() {
    let output = run_to_string(
        "
        func1 = function() return 1 end function
        func2 = function() return 2 end function
        func3 = function() return 3 end function

        funcs = [func1(), func2(), func3()]

        print(funcs[0])
        print(funcs[1])
        print(funcs[2])
    ",
    );
    assert_eq!(output, "123");
}

#[test]
fn closures_capture_their_defining_scope() {
    let output = run_to_string(
        "
        make_adder = function(n)
            return function(x) return x + n end function
        end function

        add5 = make_adder(5)
        print(add5(10))
    ",
    );
    assert_eq!(output, "15");
}

#[test]
fn assigning_a_function_literal_names_it_for_recursion() {
    let output = run_to_string(
        "
        factorial = function(n)
            if n == 0 then
                return 1
            end if
            return n * factorial(n - 1)
        end function

        print(factorial(5))
    ",
    );
    assert_eq!(output, "120");
}

#[test]
fn parameter_binding_ascends_to_the_root_scope() {
    // A function's own parameter does not shadow a same-named outer
    // variable: the assignment rule sends the bind to the shared root.
    let output = run_to_string(
        "
        value = 1
        f = function(value) return value end function
        f(99)
        print(value)
    ",
    );
    assert_eq!(output, "99");
}
