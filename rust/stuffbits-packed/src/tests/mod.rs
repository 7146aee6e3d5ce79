mod word_array_tests;
